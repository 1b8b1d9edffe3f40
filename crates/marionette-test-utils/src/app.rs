//! Bevy test app builders with various plugin combinations.

use bevy::prelude::*;

/// Create a minimal test app with only the core plugin.
///
/// Provides `MarionetteSet` ordering and the configuration resource but no
/// IK systems.
pub fn minimal_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(marionette_core::MarionetteCorePlugin);
    app.finish();
    app.cleanup();
    app
}

/// Create a test app with the core and IK plugins: the full solve pipeline.
pub fn ik_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(marionette_core::MarionetteCorePlugin);
    app.add_plugins(marionette_ik::MarionetteIkPlugin);
    app.finish();
    app.cleanup();
    app
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
