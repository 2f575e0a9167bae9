//! Emphasis state machine for apostrophe marker runs.
//!
//! Run length selects the level: 2 = italic, 3 and 4 = bold, 5 = bold italic.
//! Each level toggles independently.

const MIN_LEVEL: usize = 2;
const MAX_LEVEL: usize = 5;

/// Open/close tags per level, indexed from level 2.
const TAGS: [(&str, &str); 4] = [
    ("<i>", "</i>"),
    ("<b>", "</b>"),
    ("<b>", "</b>"),
    ("<i><b>", "</b></i>"),
];

/// Open state of every emphasis level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Emphasis {
    open: [bool; MAX_LEVEL - MIN_LEVEL + 1],
}

impl Emphasis {
    /// Whether `level` (2-5) is currently open.
    pub fn is_open(&self, level: usize) -> bool {
        (MIN_LEVEL..=MAX_LEVEL).contains(&level) && self.open[level - MIN_LEVEL]
    }

    /// Whether any level is open.
    pub fn any_open(&self) -> bool {
        self.open.iter().any(|&open| open)
    }

    /// Toggle the level selected by a run of `run` apostrophes and return the tag.
    ///
    /// When the level is closed but the level below it is open, one apostrophe
    /// is literal text and the lower level is toggled instead, so
    /// `''somethin'''` reads as `<i>somethin'</i>`.
    pub fn toggle(&mut self, run: usize) -> String {
        let mut level = run.clamp(MIN_LEVEL, MAX_LEVEL);
        let mut out = String::new();

        if !self.is_open(level) && self.is_open(level - 1) {
            level -= 1;
            out.push('\'');
        }

        let slot = &mut self.open[level - MIN_LEVEL];
        let (open_tag, close_tag) = TAGS[level - MIN_LEVEL];
        out.push_str(if *slot { close_tag } else { open_tag });
        *slot = !*slot;
        out
    }

    /// Close every open level in ascending order and return the closing tags.
    pub fn flush(&mut self) -> String {
        let mut out = String::new();
        for level in MIN_LEVEL..=MAX_LEVEL {
            if self.is_open(level) {
                out.push_str(&self.toggle(level));
            }
        }
        out
    }
}
