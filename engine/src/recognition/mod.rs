//! Gesture recognition: registry, classifier, vocabularies, and the
//! trigger debounce state machine.

pub mod classifier;
pub mod registry;
pub mod trigger;
pub mod vocabulary;
