use anyhow::{Context, Result};
use evdev::{AttributeSetRef, Device, EventType, InputEventKind, Key};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::constants::{hotkey, input, paths, permissions};
use crate::controller::ControlEvent;

/// Find all keyboard devices that can produce the hotkey
fn find_all_keyboard_devices() -> Result<Vec<Device>> {
    info!(path = %paths::DEV_INPUT, "Scanning for keyboard devices...");

    let mut devices = Vec::new();

    for entry in std::fs::read_dir(paths::DEV_INPUT)
        .context(format!("Failed to read {} - are you in the '{}' group?", paths::DEV_INPUT, permissions::INPUT_GROUP))?
    {
        let entry = entry?;
        let path = entry.path();

        if let Ok(device) = Device::open(&path)
            && let Some(keys) = device.supported_keys()
            && keys.contains(hotkey::TRIGGER)
        {
            info!(device_path = %path.display(), name = ?device.name(), "Found keyboard device");
            devices.push(device);
        }
    }

    if devices.is_empty() {
        anyhow::bail!(
            "No keyboard device found. Ensure you're in '{}' group:\n\
             {}\n\
             Then log out and back in.",
            permissions::INPUT_GROUP,
            permissions::ADD_TO_INPUT_GROUP
        )
    }

    info!(count = devices.len(), "Listening on keyboard device(s)");

    Ok(devices)
}

/// Spawn background threads that send [`ControlEvent::ToggleVisibility`]
/// whenever the hotkey is pressed on any keyboard
pub fn spawn_listener(sender: Sender<ControlEvent>) -> Result<Vec<thread::JoinHandle<()>>> {
    let devices = find_all_keyboard_devices()?;
    let mut handles = Vec::new();

    for device in devices {
        let sender = sender.clone();
        let handle = thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                info!(device = ?device.name(), hotkey = hotkey::LABEL, "Hotkey listener started");
                if let Err(e) = listen_for_hotkey(device, sender) {
                    error!(error = %e, "Hotkey listener error");
                }
            })
            .context("Failed to spawn hotkey listener thread")?;
        handles.push(handle);
    }

    Ok(handles)
}

/// Both modifier groups of the hotkey are held
pub fn modifiers_held(state: &AttributeSetRef<Key>) -> bool {
    let any = |keys: &[Key]| keys.iter().any(|key| state.contains(*key));
    any(&hotkey::CTRL) && any(&hotkey::ALT)
}

/// Listen for the hotkey on a single device
fn listen_for_hotkey(mut device: Device, sender: Sender<ControlEvent>) -> Result<()> {
    loop {
        // Fetch events (blocks until available)
        let events = device.fetch_events()
            .context("Failed to fetch events")?;

        // We need to finish with the events iterator before querying key state
        let mut presses = 0usize;

        for event in events {
            if event.event_type() != EventType::KEY {
                continue;
            }

            if let InputEventKind::Key(key) = event.kind() {
                debug!(key = ?key, value = event.value(), "Key event");
                if key == hotkey::TRIGGER && event.value() == input::KEY_PRESS {
                    presses += 1;
                }
            }
        }

        for _ in 0..presses {
            // Check real-time modifier state, batched events can be stale
            let key_state = device.get_key_state()
                .context("Failed to get keyboard state")?;

            if !modifiers_held(&key_state) {
                continue;
            }

            info!(hotkey = hotkey::LABEL, "Hotkey pressed, sending toggle");
            sender.send(ControlEvent::ToggleVisibility)
                .context("Failed to send toggle command")?;
        }
    }
}

/// Check if hotkeys are available (user has input group permissions)
pub fn check_permissions() -> bool {
    std::fs::read_dir(paths::DEV_INPUT).is_ok()
}

/// Log a helpful message when the hotkey cannot be used
pub fn print_permission_error() {
    warn!(path = %paths::DEV_INPUT, hotkey = hotkey::LABEL, "Cannot access input devices");
    warn!(group = %permissions::INPUT_GROUP, "Hotkeys require group membership");
    warn!(command = %permissions::ADD_TO_INPUT_GROUP, "Add user to input group");
    warn!("  Then log out and back in");
    warn!(continuing = true, "Continuing without hotkey support, use the tray menu to toggle");
}
