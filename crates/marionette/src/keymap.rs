//! US-ANSI virtual keycode tables for synthesized typing.
//!
//! The character table is inherently locale-flavoured; callers that need
//! locale-independent text insertion should use the accessibility `setValue`
//! path instead. Characters without a mapping fall back to a Unicode-string
//! keyboard event at the adapter level.

/// Virtual keycodes for keys clients refer to by name.
pub mod key_codes {
    pub const RETURN: u16 = 36;
    pub const TAB: u16 = 48;
    pub const SPACE: u16 = 49;
    pub const DELETE: u16 = 51;
    pub const ESCAPE: u16 = 53;
    pub const FORWARD_DELETE: u16 = 117;
    pub const HOME: u16 = 115;
    pub const END: u16 = 119;
    pub const PAGE_UP: u16 = 116;
    pub const PAGE_DOWN: u16 = 121;
    pub const ARROW_LEFT: u16 = 123;
    pub const ARROW_RIGHT: u16 = 124;
    pub const ARROW_DOWN: u16 = 125;
    pub const ARROW_UP: u16 = 126;
    pub const F1: u16 = 122;
    pub const F2: u16 = 120;
    pub const F3: u16 = 99;
    pub const F4: u16 = 118;
    pub const F5: u16 = 96;
    pub const F6: u16 = 97;
    pub const F7: u16 = 98;
    pub const F8: u16 = 100;
    pub const F9: u16 = 101;
    pub const F10: u16 = 109;
    pub const F11: u16 = 103;
    pub const F12: u16 = 111;
}

/// A keystroke resolved from a character: the virtual keycode plus whether
/// shift must be held to produce it on the US layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub keycode: u16,
    pub shift: bool,
}

impl KeyStroke {
    const fn plain(keycode: u16) -> Self {
        Self {
            keycode,
            shift: false,
        }
    }

    const fn shifted(keycode: u16) -> Self {
        Self {
            keycode,
            shift: true,
        }
    }
}

/// Resolve an ASCII character to its US-layout keystroke. Returns `None` for
/// characters the table does not cover (non-ASCII, control characters other
/// than newline/tab); those take the Unicode fallback.
pub fn keystroke_for_char(c: char) -> Option<KeyStroke> {
    use KeyStroke as K;
    let stroke = match c {
        'a' => K::plain(0),
        's' => K::plain(1),
        'd' => K::plain(2),
        'f' => K::plain(3),
        'h' => K::plain(4),
        'g' => K::plain(5),
        'z' => K::plain(6),
        'x' => K::plain(7),
        'c' => K::plain(8),
        'v' => K::plain(9),
        'b' => K::plain(11),
        'q' => K::plain(12),
        'w' => K::plain(13),
        'e' => K::plain(14),
        'r' => K::plain(15),
        'y' => K::plain(16),
        't' => K::plain(17),
        '1' => K::plain(18),
        '2' => K::plain(19),
        '3' => K::plain(20),
        '4' => K::plain(21),
        '6' => K::plain(22),
        '5' => K::plain(23),
        '=' => K::plain(24),
        '9' => K::plain(25),
        '7' => K::plain(26),
        '-' => K::plain(27),
        '8' => K::plain(28),
        '0' => K::plain(29),
        ']' => K::plain(30),
        'o' => K::plain(31),
        'u' => K::plain(32),
        '[' => K::plain(33),
        'i' => K::plain(34),
        'p' => K::plain(35),
        'l' => K::plain(37),
        'j' => K::plain(38),
        '\'' => K::plain(39),
        'k' => K::plain(40),
        ';' => K::plain(41),
        '\\' => K::plain(42),
        ',' => K::plain(43),
        '/' => K::plain(44),
        'n' => K::plain(45),
        'm' => K::plain(46),
        '.' => K::plain(47),
        '`' => K::plain(50),
        ' ' => K::plain(key_codes::SPACE),
        '\n' | '\r' => K::plain(key_codes::RETURN),
        '\t' => K::plain(key_codes::TAB),

        'A' => K::shifted(0),
        'S' => K::shifted(1),
        'D' => K::shifted(2),
        'F' => K::shifted(3),
        'H' => K::shifted(4),
        'G' => K::shifted(5),
        'Z' => K::shifted(6),
        'X' => K::shifted(7),
        'C' => K::shifted(8),
        'V' => K::shifted(9),
        'B' => K::shifted(11),
        'Q' => K::shifted(12),
        'W' => K::shifted(13),
        'E' => K::shifted(14),
        'R' => K::shifted(15),
        'Y' => K::shifted(16),
        'T' => K::shifted(17),
        '!' => K::shifted(18),
        '@' => K::shifted(19),
        '#' => K::shifted(20),
        '$' => K::shifted(21),
        '^' => K::shifted(22),
        '%' => K::shifted(23),
        '+' => K::shifted(24),
        '(' => K::shifted(25),
        '&' => K::shifted(26),
        '_' => K::shifted(27),
        '*' => K::shifted(28),
        ')' => K::shifted(29),
        '}' => K::shifted(30),
        'O' => K::shifted(31),
        'U' => K::shifted(32),
        '{' => K::shifted(33),
        'I' => K::shifted(34),
        'P' => K::shifted(35),
        'L' => K::shifted(37),
        'J' => K::shifted(38),
        '"' => K::shifted(39),
        'K' => K::shifted(40),
        ':' => K::shifted(41),
        '|' => K::shifted(42),
        '<' => K::shifted(43),
        '?' => K::shifted(44),
        'N' => K::shifted(45),
        'M' => K::shifted(46),
        '>' => K::shifted(47),
        '~' => K::shifted(50),
        _ => return None,
    };
    Some(stroke)
}

/// Resolve a named key (as sent to `/key`) to its virtual keycode. Single
/// characters fall back to the character table.
pub fn keycode_for_name(name: &str) -> Option<KeyStroke> {
    use key_codes::*;
    let code = match name.to_ascii_lowercase().as_str() {
        "return" | "enter" => RETURN,
        "tab" => TAB,
        "space" => SPACE,
        "delete" | "backspace" => DELETE,
        "forwarddelete" | "forward_delete" => FORWARD_DELETE,
        "escape" | "esc" => ESCAPE,
        "left" | "arrowleft" => ARROW_LEFT,
        "right" | "arrowright" => ARROW_RIGHT,
        "down" | "arrowdown" => ARROW_DOWN,
        "up" | "arrowup" => ARROW_UP,
        "home" => HOME,
        "end" => END,
        "pageup" | "page_up" => PAGE_UP,
        "pagedown" | "page_down" => PAGE_DOWN,
        "f1" => F1,
        "f2" => F2,
        "f3" => F3,
        "f4" => F4,
        "f5" => F5,
        "f6" => F6,
        "f7" => F7,
        "f8" => F8,
        "f9" => F9,
        "f10" => F10,
        "f11" => F11,
        "f12" => F12,
        other => {
            let mut chars = other.chars();
            let first = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            // Single character: use the typed-character table so "a" and
            // "A" both resolve.
            return keystroke_for_char(first)
                .or_else(|| keystroke_for_char(first.to_ascii_lowercase()));
        }
    };
    Some(KeyStroke::plain(code))
}
