pub mod ranking;
pub mod recommender;
pub mod rotation;
pub mod scoring;
