use evdevil::event::{EventType, InputEvent};

pub const INPUT_EVENT_SIZE_32: usize = 16;
pub const INPUT_EVENT_SIZE_64: usize = 24;

/// Size of `struct input_event` on the host we are running on.
pub const INPUT_EVENT_SIZE: usize = std::mem::size_of::<libc::input_event>();

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0;
pub const SYN_MT_REPORT: u16 = 2;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;

pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;

pub const KEY_ENTER: u16 = 28;
pub const KEY_HOME: u16 = 102;
pub const KEY_UP: u16 = 103;
pub const KEY_DOWN: u16 = 108;
pub const KEY_VOLUMEDOWN: u16 = 114;
pub const KEY_VOLUMEUP: u16 = 115;
pub const KEY_POWER: u16 = 116;
pub const KEY_BACK: u16 = 158;
pub const KEY_MAX: u16 = 0x2ff;
pub const KEY_CNT: usize = KEY_MAX as usize + 1;

/// Digitizer buttons (BTN_TOOL_*, BTN_TOUCH, ...) belong to the touch protocol,
/// not to the key registrar.
pub const BTN_DIGI_FIRST: u16 = 0x140;
pub const BTN_DIGI_LAST: u16 = 0x14f;

/// Value of an EV_KEY event.
pub const KEY_RELEASED: i32 = 0;
pub const KEY_PRESSED: i32 = 1;
pub const KEY_REPEATED: i32 = 2;

/// One decoded kernel event, tagged with the index of the device it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub device: usize,
    pub ty: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(device: usize, ev: &InputEvent) -> Self {
        Self {
            device,
            ty: ev.event_type().raw(),
            code: ev.raw_code(),
            value: ev.raw_value(),
        }
    }

    pub fn is_touch(&self) -> bool {
        match self.ty {
            EV_SYN | EV_ABS => true,
            EV_KEY => is_digitizer_button(self.code),
            _ => false,
        }
    }
}

pub fn is_digitizer_button(code: u16) -> bool {
    (BTN_DIGI_FIRST..=BTN_DIGI_LAST).contains(&code)
}

/// Parse a Linux input_event from raw bytes (32-bit or 64-bit format).
pub fn parse_input_event(buf: &[u8]) -> Option<InputEvent> {
    match buf.len() {
        INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        _ => None,
    }
}

fn parse_input_event_32(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[8], buf[9]]);
    let code = u16::from_le_bytes([buf[10], buf[11]]);
    let value = i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

fn parse_input_event_64(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[16], buf[17]]);
    let code = u16::from_le_bytes([buf[18], buf[19]]);
    let value = i32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

/// Human-readable name for an event, used by the `dump` command and debug logs.
pub fn code_name(ty: u16, code: u16) -> String {
    match ty {
        EV_SYN => match code {
            SYN_REPORT => "SYN_REPORT".into(),
            SYN_MT_REPORT => "SYN_MT_REPORT".into(),
            _ => format!("SYN/{}", code),
        },
        EV_KEY => match code {
            0x145 => "BTN_TOOL_FINGER".into(),
            0x14a => "BTN_TOUCH".into(),
            KEY_POWER => "KEY_POWER".into(),
            KEY_VOLUMEUP => "KEY_VOLUMEUP".into(),
            KEY_VOLUMEDOWN => "KEY_VOLUMEDOWN".into(),
            _ => format!("KEY/{}", code),
        },
        EV_REL => match code {
            REL_X => "REL_X".into(),
            REL_Y => "REL_Y".into(),
            0x02 => "REL_Z".into(),
            _ => format!("REL/{}", code),
        },
        EV_ABS => {
            let abs = match code {
                0x00 => "X",
                0x01 => "Y",
                0x18 => "PRESSURE",
                ABS_MT_SLOT => "MT_SLOT",
                ABS_MT_TOUCH_MAJOR => "MT_TOUCH_MAJOR",
                0x31 => "MT_TOUCH_MINOR",
                0x32 => "MT_WIDTH_MAJOR",
                0x33 => "MT_WIDTH_MINOR",
                0x34 => "MT_ORIENTATION",
                ABS_MT_POSITION_X => "MT_POSITION_X",
                ABS_MT_POSITION_Y => "MT_POSITION_Y",
                ABS_MT_TRACKING_ID => "MT_TRACKING_ID",
                ABS_MT_PRESSURE => "MT_PRESSURE",
                _ => "?",
            };
            format!("ABS_{}({})", abs, code)
        }
        _ => format!("type{} code{}", ty, code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_64(ty: u16, code: u16, value: i32) -> [u8; INPUT_EVENT_SIZE_64] {
        let mut buf = [0u8; INPUT_EVENT_SIZE_64];
        buf[16..18].copy_from_slice(&ty.to_le_bytes());
        buf[18..20].copy_from_slice(&code.to_le_bytes());
        buf[20..24].copy_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_parse_64bit_event() {
        let buf = raw_64(EV_ABS, ABS_MT_TRACKING_ID, -1);
        let ev = parse_input_event(&buf).unwrap();
        let raw = RawEvent::new(3, &ev);
        assert_eq!(raw, RawEvent { device: 3, ty: EV_ABS, code: ABS_MT_TRACKING_ID, value: -1 });
    }

    #[test]
    fn test_parse_32bit_event() {
        let mut buf = [0u8; INPUT_EVENT_SIZE_32];
        buf[8..10].copy_from_slice(&EV_KEY.to_le_bytes());
        buf[10..12].copy_from_slice(&KEY_POWER.to_le_bytes());
        buf[12..16].copy_from_slice(&1i32.to_le_bytes());
        let ev = parse_input_event(&buf).unwrap();
        assert_eq!(ev.raw_code(), KEY_POWER);
        assert_eq!(ev.raw_value(), 1);
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(parse_input_event(&[0u8; 8]).is_none());
    }

    #[test]
    fn test_touch_routing() {
        let btn_touch = RawEvent { device: 0, ty: EV_KEY, code: 0x14a, value: 1 };
        let power = RawEvent { device: 0, ty: EV_KEY, code: KEY_POWER, value: 1 };
        let syn = RawEvent { device: 0, ty: EV_SYN, code: SYN_REPORT, value: 0 };
        assert!(btn_touch.is_touch());
        assert!(!power.is_touch());
        assert!(syn.is_touch());
    }

    #[test]
    fn test_code_names() {
        assert_eq!(code_name(EV_SYN, SYN_REPORT), "SYN_REPORT");
        assert_eq!(code_name(EV_ABS, ABS_MT_POSITION_X), "ABS_MT_POSITION_X(53)");
        assert_eq!(code_name(EV_KEY, 30), "KEY/30");
    }
}
