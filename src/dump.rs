//! Dump raw input events from a local device for debugging.
//! Run: recovery-input dump /dev/input/event1 [--classify]

use std::path::Path;

use recovery_input::config::Config;
use recovery_input::device::InputDevice;
use recovery_input::input::calibration::probe_touch_axes;
use recovery_input::input::event::code_name;
use recovery_input::input::touch::{TouchClassifier, TouchPhase, TouchSession};

pub fn run_dump(
    path: &Path,
    classify: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut device = InputDevice::open(path)?;

    let mut classifier = if classify {
        let mut classifier = TouchClassifier::new(config.screen_width, config.screen_height);
        match probe_touch_axes(path) {
            Ok((x, y)) => classifier.calibrate(x, y),
            Err(e) => log::warn!("No touch axes on {} ({}), printing raw coordinates", path.display(), e),
        }
        Some(classifier)
    } else {
        None
    };

    eprintln!("Dumping events from {} (Ctrl+C to stop):\n", path.display());
    let mut n = 0u64;
    loop {
        let Some(ev) = device.read_event(0)? else {
            continue;
        };
        n += 1;
        println!("{:6}  {}  value={}", n, code_name(ev.ty, ev.code), ev.value);

        let Some(classifier) = classifier.as_mut() else {
            continue;
        };
        if let Some(phase) = classifier.process(&ev) {
            let line = phase_line(
                &phase,
                classifier.session(),
                classifier.protocol().active_slot_count,
            );
            println!("        -> {}", line);
        }
    }
}

/// Describe a classifier phase. `session` is the live session after the report.
fn phase_line(phase: &TouchPhase, session: Option<&TouchSession>, active_slots: i32) -> String {
    match (phase, session) {
        (TouchPhase::Press, Some(s)) => format!("press at ({}, {})", s.start.x, s.start.y),
        (TouchPhase::Move, Some(s)) => format!("move to ({}, {})", s.end.x, s.end.y),
        (TouchPhase::Release(s), _) => {
            let (dx, dy) = s.delta();
            format!(
                "release at ({}, {}), delta ({}, {}), slots={}",
                s.end.x, s.end.y, dx, dy, active_slots
            )
        }
        (TouchPhase::Press, None) => "press".into(),
        (TouchPhase::Move, None) => "move".into(),
    }
}
