//! Topic selection at interview start

use examiner_config::{Topic, TopicCatalog};
use rand::seq::SliceRandom;

/// Picks the topic for a new interview
pub trait TopicSelector: Send + Sync + 'static {
    fn choose<'a>(&self, catalog: &'a TopicCatalog) -> Option<&'a Topic>;
}

/// Uniform random choice
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTopicSelector;

impl TopicSelector for RandomTopicSelector {
    fn choose<'a>(&self, catalog: &'a TopicCatalog) -> Option<&'a Topic> {
        catalog.topics().choose(&mut rand::thread_rng())
    }
}

/// Always the named topic
#[derive(Debug, Clone)]
pub struct FixedTopicSelector(pub String);

impl TopicSelector for FixedTopicSelector {
    fn choose<'a>(&self, catalog: &'a TopicCatalog) -> Option<&'a Topic> {
        catalog.get(&self.0)
    }
}
