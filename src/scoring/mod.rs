pub mod appetite;
pub mod bands;
pub mod config;
pub mod diligence;
pub mod error;
pub mod materiality;
pub mod register;
pub mod tier;
pub mod validation;
pub mod vendor;

pub use appetite::{Direction, MetricStatus, Rag, Trend};
pub use bands::Bands;
pub use config::ScoringConfig;
pub use diligence::{Answer, DiligencePolicy, DiligenceStatus, Questionnaire, Resolution};
pub use error::ScoringError;
pub use materiality::Materiality;
pub use tier::Tier;
pub use validation::validate_scoring;
pub use vendor::{
    AiUsage, DataSensitivity, HostingLocation, JurisdictionPolicy, ServiceCriticality,
    Subcontractors, VendorAssessment, VendorProfile,
};
