/// Background shot clock driver.
pub mod clock_driver;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Roster and archive read access.
pub mod public_service;
/// Server-Sent Events message generation and the session relay.
pub mod session_events;
/// Session command handling.
pub mod session_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
