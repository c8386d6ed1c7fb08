// Domain-layer modules and shared errors/models
pub mod models {
    pub use crate::models::*;
}

pub mod validation {
    pub use crate::validation::*;
}

pub mod query_builder {
    pub use crate::query_builder::*;
}

pub mod import {
    pub use crate::import::*;
}

pub mod csv_transfer {
    pub use crate::csv_transfer::*;
}

pub mod errors {
    pub use crate::errors::*;
}
