//! Resource routers.

pub mod cases;
pub mod jurisdictions;
pub mod orgs;
pub mod projects;
