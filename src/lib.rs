//! # ghd - Terminal Deployment Dashboard
//!
//! A keyboard-driven terminal dashboard for deployments, built on a small
//! retained-mode widget toolkit.
//!
//! ## Features
//!
//! - **Widget Tree**: Flex layout, transitive focus and per-key signals routed
//!   through the focus chain
//! - **Typed Signals**: Sync and async publish/subscribe with weak handlers and
//!   RAII subscriptions
//! - **Virtualized Tables**: Only visible rows are rendered, with vertical and
//!   horizontal scrolling
//! - **Cooperative Runtime**: One `LocalSet`-driven loop owns the UI while a
//!   dedicated thread reads the terminal
//! - **Testable Rendering**: A virtual terminal backend for golden-output tests
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`signal`] - Signal/slot primitives and event flow results
//! - [`input`] - Key decoding and the blocking input thread
//! - [`render`] - Screen buffer, themes and terminal backends
//! - [`widget`] - Widget tree, layout and the stock widgets
//! - [`timer`] - Periodic callbacks on the UI loop
//! - [`config`] - Runtime settings
//! - [`app`] - Application loop
//! - [`dashboard`] - The deployments dashboard

// Core modules
pub mod error;
pub mod signal;

// Subsystems
pub mod input;
pub mod render;
pub mod timer;
pub mod widget;

// Application
pub mod app;
pub mod config;
pub mod dashboard;

// Re-export commonly used types for convenience
pub use error::{GhdError, Result, SignalError};
pub use signal::{AsyncSignal, EventFlow, Signal, Subscription};

// Public API surface for external usage
pub use app::Application;
pub use config::Config;
pub use dashboard::{DeploymentProvider, MainWindow, SampleProvider};
pub use timer::Timer;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
