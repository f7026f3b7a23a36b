//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

use std::time::Duration;

/// X11 protocol and rendering constants
pub mod x11 {
    /// ARGB color depth (32-bit: 8 bits each for Alpha, Red, Green, Blue)
    pub const ARGB_DEPTH: u8 = 32;

    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// WM_CLASS value (instance and class, NUL separated)
    pub const WM_CLASS: &[u8] = b"screen-border\0screen-border\0";

    /// RandR version that introduced GetMonitors
    pub const RANDR_MAJOR: u32 = 1;
    pub const RANDR_MINOR: u32 = 5;

    /// XFixes version that introduced SetWindowShapeRegion
    pub const XFIXES_MAJOR: u32 = 5;
    pub const XFIXES_MINOR: u32 = 0;
}

/// Overlay appearance
pub mod overlay {
    use super::Duration;

    /// Border thickness in pixels on every side of every display
    pub const BORDER_WIDTH: u16 = 20;

    /// Alpha applied when drawing the border (never persisted)
    pub const ALPHA: u8 = 100;

    /// Delay between showing a window and making it click-through
    pub const CLICK_THROUGH_DELAY: Duration = Duration::from_millis(100);
}

/// Default border color (RGB)
pub mod color {
    pub const DEFAULT_RED: u8 = 0;
    pub const DEFAULT_GREEN: u8 = 120;
    pub const DEFAULT_BLUE: u8 = 255;
}

/// Main loop timing
pub mod event_loop {
    use super::Duration;

    /// Upper bound on how long the main loop waits for a control event
    /// before polling the X server again
    pub const POLL_INTERVAL: Duration = Duration::from_millis(20);
}

/// Input event constants (from evdev)
pub mod input {
    /// Key press event value
    pub const KEY_PRESS: i32 = 1;
}

/// Global hotkey (Ctrl+Alt+B)
pub mod hotkey {
    use evdev::Key;

    pub const TRIGGER: Key = Key::KEY_B;
    pub const CTRL: [Key; 2] = [Key::KEY_LEFTCTRL, Key::KEY_RIGHTCTRL];
    pub const ALT: [Key; 2] = [Key::KEY_LEFTALT, Key::KEY_RIGHTALT];

    /// Human-readable form for logs and the tray tooltip
    pub const LABEL: &str = "Ctrl+Alt+B";
}

/// System tray constants
pub mod tray {
    use super::Duration;

    pub const ID: &str = "screen-border";
    pub const TITLE: &str = "Screen Border";

    /// Tray icon edge length in pixels
    pub const ICON_SIZE: i32 = 32;

    /// Transparent margin around the icon's rounded square
    pub const ICON_MARGIN: i32 = 2;

    /// Corner radius of the icon's rounded square
    pub const ICON_RADIUS: i32 = 6;

    /// How long startup waits for the tray to register before giving up
    pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
}

/// External color picker
pub mod picker {
    pub const PROGRAM: &str = "zenity";
    pub const TITLE: &str = "Border Color";
}

/// File system paths
pub mod paths {
    /// Linux input device directory
    pub const DEV_INPUT: &str = "/dev/input";
}

/// Permission-related constants
pub mod permissions {
    /// Linux input group name
    pub const INPUT_GROUP: &str = "input";

    /// Command to add user to input group
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
}

/// Configuration file constants
pub mod config {
    /// Application config directory name
    pub const APP_DIR: &str = "screen-border";

    /// Config filename
    pub const FILENAME: &str = "config.json";

    /// Environment variable overriding the config file location
    pub const PATH_ENV: &str = "SCREEN_BORDER_CONFIG";
}
