//! Facade queries: loaded-image replay and end-to-end scenarios.
