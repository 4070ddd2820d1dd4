pub mod campaign;
pub mod catalog;
pub mod dispatcher;
pub mod model_selector;
pub mod providers;
pub mod recommendations;

pub use campaign::{Campaign, CampaignSettings};
pub use dispatcher::BatchDispatcher;
pub use model_selector::{ModelSelector, SelectionPolicy};
pub use recommendations::RecommendationGenerator;
