//! Raw call stacks and the location records they are made of.
//!
//! [`RawStack::capture`] walks the current thread's stack with the `backtrace`
//! crate and turns every resolved symbol into a [`SourceLocation`]. Inlined
//! functions get one location each, so the sequence reads like a runtime's
//! native stack trace: most recent call first.

use std::fmt;

use backtrace::Backtrace;

/// Declaring path of [`RawStack`], used to trim the capture machinery.
const CAPTURE_TYPE: &str = concat!(module_path!(), "::RawStack");

// ============================================================================
// SourceLocation
// ============================================================================

/// One call site in a raw stack: declaring path, function and line.
///
/// Every part is optional because symbol resolution can fail (stripped
/// binaries, missing debuginfo). A location with nothing resolved still renders.
///
/// For methods, `type_name` is the type the method is declared on; for free
/// functions it is the enclosing module. Trait methods called through
/// `<T as Trait>::f` also carry the trait path.
///
/// ## Example
///
/// ```rust
/// use snaptrace::SourceLocation;
///
/// let loc = SourceLocation::from_symbol("<app::db::Pool as app::db::Connect>::open::{{closure}}");
/// assert_eq!(loc.type_name(), Some("app::db::Pool"));
/// assert_eq!(loc.trait_name(), Some("app::db::Connect"));
/// assert_eq!(loc.function(), Some("open"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    type_name: Option<String>,
    trait_name: Option<String>,
    function: Option<String>,
    file: Option<String>,
    line: Option<u32>,
}

impl SourceLocation {
    /// Create a resolved location.
    pub fn new(type_name: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            type_name: Some(type_name.into()),
            trait_name: None,
            function: Some(function.into()),
            file: None,
            line: Some(line),
        }
    }

    /// A location with nothing resolved.
    #[inline]
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Parse a demangled symbol name (without hash) into a location.
    ///
    /// Closure segments, generic arguments and a trailing legacy hash are
    /// stripped. File and line are left unset.
    pub fn from_symbol(symbol: &str) -> Self {
        let (type_name, trait_name, function) = parse_symbol(symbol);
        Self {
            type_name,
            trait_name,
            function,
            file: None,
            line: None,
        }
    }

    /// Set the trait path for `<T as Trait>::f` frames.
    pub fn with_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.trait_name = Some(trait_name.into());
        self
    }

    /// Set the source file.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the line number.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline]
    pub fn trait_name(&self) -> Option<&str> {
        self.trait_name.as_deref()
    }

    #[inline]
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Whether the symbol for this location was resolved.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.function.is_some()
    }

    /// Case-sensitive suffix match on the declaring type or the trait.
    pub fn declared_in(&self, suffix: &str) -> bool {
        let matches = |name: &Option<String>| name.as_deref().is_some_and(|n| n.ends_with(suffix));
        matches(&self.type_name) || matches(&self.trait_name)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function.as_deref().unwrap_or("<unknown>");
        match (&self.type_name, &self.trait_name) {
            (Some(ty), Some(tr)) => write!(f, "<{} as {}>::{}", ty, tr, function)?,
            (Some(ty), None) => write!(f, "{}::{}", ty, function)?,
            (None, _) => write!(f, "{}", function)?,
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "[{}:{}]", file, line),
            (Some(file), None) => write!(f, "[{}:?]", file),
            (None, Some(line)) => write!(f, "[{}]", line),
            (None, None) => write!(f, "[?]"),
        }
    }
}

// ============================================================================
// Symbol parsing
// ============================================================================

/// Split a demangled symbol into (declaring path, trait path, function).
fn parse_symbol(symbol: &str) -> (Option<String>, Option<String>, Option<String>) {
    let symbol = strip_hash(symbol.trim());

    if symbol.starts_with('<') {
        if let Some(close) = matching_angle(symbol) {
            let qualified = &symbol[1..close];
            let rest = symbol[close + 1..].trim_start_matches("::");
            let (self_ty, trait_ty) = match split_top_level_as(qualified) {
                Some((s, t)) => (s, Some(t)),
                None => (qualified, None),
            };
            let function = path_segments(rest).pop();
            return (
                non_empty(strip_generics(self_ty)),
                trait_ty.and_then(|t| non_empty(strip_generics(t))),
                function,
            );
        }
    }

    let mut segments = path_segments(symbol);
    let function = segments.pop();
    let type_name = if segments.is_empty() {
        None
    } else {
        Some(segments.join("::"))
    };
    (type_name, None, function)
}

/// Drop a trailing legacy-mangling hash segment (`::h0123456789abcdef`).
fn strip_hash(symbol: &str) -> &str {
    if let Some((head, last)) = symbol.rsplit_once("::") {
        let is_hash = last.len() == 17
            && last.starts_with('h')
            && last[1..].chars().all(|c| c.is_ascii_hexdigit());
        if is_hash {
            return head;
        }
    }
    symbol
}

/// Index of the `>` closing the `<` at position 0.
fn matching_angle(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev = '\0';
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        prev = c;
    }
    None
}

/// Split `Self as Trait` at the first ` as ` outside generic brackets.
fn split_top_level_as(qualified: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut prev = '\0';
    for (i, c) in qualified.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 && qualified[i..].starts_with(" as ") => {
                return Some((&qualified[..i], &qualified[i + 4..]));
            }
            _ => {}
        }
        prev = c;
    }
    None
}

/// Remove every balanced `<...>` group.
fn strip_generics(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    let mut prev = '\0';
    for c in s.chars() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
        prev = c;
    }
    out
}

/// Path segments with generics, closures and shims removed.
fn path_segments(path: &str) -> Vec<String> {
    strip_generics(path)
        .split("::")
        .filter(|seg| !seg.is_empty() && !seg.starts_with('{'))
        .map(str::to_owned)
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

// ============================================================================
// RawStack
// ============================================================================

/// An ordered call stack, most recent location first.
///
/// Either captured from the running thread with [`capture()`](Self::capture)
/// or assembled from locations you already have (tests, foreign runtimes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStack {
    locations: Vec<SourceLocation>,
}

impl RawStack {
    /// An empty stack.
    #[inline]
    pub const fn new() -> Self {
        Self {
            locations: Vec::new(),
        }
    }

    /// Capture and resolve the current thread's call stack.
    ///
    /// Frames belonging to the capture itself are trimmed, so the first
    /// location is the caller of this function. If symbols cannot be resolved
    /// the stack is kept whole, with unresolved locations.
    #[inline(never)]
    pub fn capture() -> Self {
        let backtrace = Backtrace::new();
        let mut locations = Vec::with_capacity(backtrace.frames().len());

        for frame in backtrace.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                locations.push(SourceLocation::unresolved());
                continue;
            }
            // One entry per symbol: inlined callees come first within a frame.
            for symbol in symbols {
                let mut location = symbol
                    .name()
                    .map(|name| SourceLocation::from_symbol(&format!("{:#}", name)))
                    .unwrap_or_default();
                location.file = symbol.filename().map(|p| p.display().to_string());
                location.line = symbol.lineno();
                locations.push(location);
            }
        }

        let capture_frame = locations
            .iter()
            .position(|loc| loc.declared_in(CAPTURE_TYPE) && loc.function() == Some("capture"));
        if let Some(pos) = capture_frame {
            locations.drain(..=pos);
        }

        Self { locations }
    }

    /// Drop leading (most recent) locations while `pred` holds.
    pub(crate) fn trim_top<P: FnMut(&SourceLocation) -> bool>(&mut self, mut pred: P) {
        let keep_from = self
            .locations
            .iter()
            .position(|loc| !pred(loc))
            .unwrap_or(self.locations.len());
        self.locations.drain(..keep_from);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations, most recent first.
    #[inline]
    pub fn as_slice(&self) -> &[SourceLocation] {
        &self.locations
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SourceLocation> + '_ {
        self.locations.iter()
    }
}

impl From<Vec<SourceLocation>> for RawStack {
    fn from(locations: Vec<SourceLocation>) -> Self {
        Self { locations }
    }
}

impl FromIterator<SourceLocation> for RawStack {
    fn from_iter<I: IntoIterator<Item = SourceLocation>>(iter: I) -> Self {
        Self {
            locations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawStack {
    type Item = SourceLocation;
    type IntoIter = std::vec::IntoIter<SourceLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.into_iter()
    }
}
