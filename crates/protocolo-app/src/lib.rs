// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod ids;
pub mod list;
pub mod model;
pub mod query;
pub mod state;

pub use ids::*;
pub use list::*;
pub use model::*;
pub use query::*;
pub use state::*;
