// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod forms;
pub mod ids;
pub mod list;
pub mod model;
pub mod query;
pub mod remote;
pub mod sort;
pub mod state;

pub use forms::*;
pub use ids::*;
pub use list::*;
pub use model::*;
pub use query::*;
pub use remote::*;
pub use sort::*;
pub use state::*;
