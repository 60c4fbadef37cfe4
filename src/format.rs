//! Line-oriented `path.field = value; % comment` text format.
//!
//! ```text
//! data.a = 0.0; % lower bound
//! data.n = 4; % intervals
//! data.w = [1.0,2.0,3.0]; % weights
//! ```
//!
//! Reading is tolerant: lines without `=` are skipped, everything after
//! `%` is a comment, a trailing `;` and surrounding single quotes are
//! dropped. A field is addressed by its last dotted component (the key)
//! and optionally the component before it (the scope), so `data.x.a`
//! has scope `x` and key `a`.

use crate::{snapshot::CarrierData, SplineError, PATH_BUDGET};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a text load was rejected.
#[derive(Error, Debug)]
pub(crate) enum FormatError {
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),

    #[error("required field `{0}` is missing or malformed")]
    MissingField(String),

    #[error(transparent)]
    Spline(#[from] SplineError),
}

#[derive(Clone, Debug)]
struct Field {
    scope: Option<String>,
    key: String,
    value: String,
}

/// All `key = value` lines of a text source.
#[derive(Clone, Debug, Default)]
pub struct FieldReader {
    fields: Vec<Field>,
}

impl FieldReader {
    /// Reads all lines of `reader`.
    pub fn read<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut fields = Vec::new();
        for line in reader.lines() {
            if let Some(field) = parse_line(&line?) {
                fields.push(field);
            }
        }
        Ok(Self { fields })
    }

    /// Number of recognised fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw value of the last field named `key`. With a `scope` only fields
    /// in that scope match.
    pub fn raw(&self, scope: Option<&str>, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| {
                f.key == key
                    && scope.is_none_or(|s| f.scope.as_deref() == Some(s))
            })
            .map(|f| f.value.as_str())
    }

    pub fn get_f64(&self, scope: Option<&str>, key: &str) -> Option<f64> {
        let value = self.raw(scope, key)?;
        if value.contains('[') {
            return None;
        }
        value.parse().ok()
    }

    /// Integers are accepted as written or as integral floats such as
    /// `4.0`. Fractional values are rejected.
    pub fn get_usize(&self, scope: Option<&str>, key: &str) -> Option<usize> {
        let value = self.raw(scope, key)?;
        if value.contains('[') {
            return None;
        }
        value.parse::<usize>().ok().or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| *v >= 0.0 && v.is_finite() && v.fract() == 0.0)
                .map(|v| v as usize)
        })
    }

    /// Elements of a `[v0,v1,...]` array; separators are commas and
    /// whitespace, unparsable elements are skipped.
    pub fn get_array(&self, scope: Option<&str>, key: &str) -> Option<Vec<f64>> {
        let value = self.raw(scope, key)?;
        let start = value.find('[')?;
        let end = value.rfind(']')?;
        if end <= start {
            return None;
        }
        Some(
            value[start + 1..end]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect(),
        )
    }

    pub(crate) fn require_f64(
        &self,
        scope: Option<&str>,
        key: &str,
    ) -> Result<f64, FormatError> {
        self.get_f64(scope, key)
            .ok_or_else(|| missing(scope, key))
    }

    pub(crate) fn require_usize(
        &self,
        scope: Option<&str>,
        key: &str,
    ) -> Result<usize, FormatError> {
        self.get_usize(scope, key)
            .ok_or_else(|| missing(scope, key))
    }

    pub(crate) fn require_array(
        &self,
        scope: Option<&str>,
        key: &str,
    ) -> Result<Vec<f64>, FormatError> {
        self.get_array(scope, key)
            .ok_or_else(|| missing(scope, key))
    }
}

/// Parses `reader` and replaces `target` with what `build` makes of the
/// fields. Failures are logged and leave `target` untouched.
pub(crate) fn load_into<R, T, F>(reader: R, target: &mut T, what: &str, build: F) -> bool
where
    R: BufRead,
    F: FnOnce(&FieldReader) -> Result<T, FormatError>,
{
    let result = FieldReader::read(reader)
        .map_err(FormatError::from)
        .and_then(|fields| build(&fields));
    match result {
        Ok(loaded) => {
            *target = loaded;
            debug!(what, "loaded spline");
            true
        }
        Err(err) => {
            warn!(what, %err, "spline load aborted");
            false
        }
    }
}

/// Runs `write` against a [`FieldWriter`] for `path` and flushes.
pub(crate) fn save_with<W, F>(writer: W, path: &str, what: &str, write: F) -> bool
where
    W: Write,
    F: FnOnce(&mut FieldWriter<W>) -> io::Result<()>,
{
    let Some(mut fields) = FieldWriter::new(writer, path) else {
        warn!(what, len = path.len(), "spline path exceeds the path budget");
        return false;
    };
    match write(&mut fields).and_then(|()| fields.flush()) {
        Ok(()) => true,
        Err(err) => {
            warn!(what, %err, "spline save failed");
            false
        }
    }
}

/// Reads `a`, `b`, `n` and `k` of one axis.
pub(crate) fn read_carrier(
    fields: &FieldReader,
    scope: Option<&str>,
) -> Result<CarrierData, FormatError> {
    Ok(CarrierData {
        a: fields.require_f64(scope, "a")?,
        b: fields.require_f64(scope, "b")?,
        n: fields.require_usize(scope, "n")?,
        k: fields.require_usize(scope, "k")?,
    })
}

/// Writes `a`, `b`, `n` and `k` of one axis, keys prefixed by `prefix`.
pub(crate) fn write_carrier<W: Write>(
    fields: &mut FieldWriter<W>,
    prefix: &str,
    data: &CarrierData,
) -> io::Result<()> {
    fields.write_f64(&format!("{prefix}a"), data.a, "lower bound")?;
    fields.write_f64(&format!("{prefix}b"), data.b, "upper bound")?;
    fields.write_usize(&format!("{prefix}n"), data.n, "intervals")?;
    fields.write_usize(&format!("{prefix}k"), data.k, "order")
}

/// Reads the weight array and checks its length.
pub(crate) fn read_weights(
    fields: &FieldReader,
    expected: usize,
) -> Result<Vec<f64>, FormatError> {
    let weights = fields.require_array(None, "w")?;
    if weights.len() != expected {
        return Err(SplineError::SizeMismatch {
            expected,
            actual: weights.len(),
        }
        .into());
    }
    Ok(weights)
}

fn missing(scope: Option<&str>, key: &str) -> FormatError {
    FormatError::MissingField(match scope {
        Some(scope) => format!("{scope}.{key}"),
        None => key.to_string(),
    })
}

fn parse_line(line: &str) -> Option<Field> {
    let line = match line.find('%') {
        Some(i) => &line[..i],
        None => line,
    };
    let (name, value) = line.split_once('=')?;

    let mut parts = name.trim().rsplit('.');
    let key = parts.next()?.trim();
    if key.is_empty() {
        return None;
    }
    let scope = parts.next().map(|s| s.trim().to_string());

    let value = value.trim();
    let value = value.strip_suffix(';').unwrap_or(value).trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value);

    Some(Field {
        scope,
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Writes `path.key = value; % comment` lines.
pub struct FieldWriter<W: Write> {
    writer: W,
    path: String,
}

impl<W: Write> FieldWriter<W> {
    /// Returns `None` if `path` does not fit the path budget.
    pub fn new(writer: W, path: &str) -> Option<Self> {
        if path.len() + 1 >= PATH_BUDGET {
            return None;
        }
        Some(Self {
            writer,
            path: path.to_string(),
        })
    }

    /// Floats use the shortest representation that reads back exactly.
    pub fn write_f64(&mut self, key: &str, value: f64, comment: &str) -> io::Result<()> {
        writeln!(self.writer, "{}.{} = {:?}; % {}", self.path, key, value, comment)
    }

    pub fn write_usize(&mut self, key: &str, value: usize, comment: &str) -> io::Result<()> {
        writeln!(self.writer, "{}.{} = {}; % {}", self.path, key, value, comment)
    }

    pub fn write_array(&mut self, key: &str, values: &[f64], comment: &str) -> io::Result<()> {
        write!(self.writer, "{}.{} = [", self.path, key)?;
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                write!(self.writer, ",")?;
            }
            write!(self.writer, "{v:?}")?;
        }
        writeln!(self.writer, "]; % {comment}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
% a comment line
data.a = -1.5; % lower bound
data.n = 4.0;
data.x.k = 3;
data.y.k = '2';
garbage without equals sign
data.w = [1, 2.5,  3e-3
data.v = [1,2.5, 3e-3 ,x]; % weights
";

    #[test]
    fn reads_scalars_and_arrays() {
        let fields = FieldReader::read(SAMPLE.as_bytes()).unwrap();
        assert_eq!(fields.get_f64(None, "a"), Some(-1.5));
        assert_eq!(fields.get_usize(None, "n"), Some(4));
        assert_eq!(fields.get_usize(Some("x"), "k"), Some(3));
        assert_eq!(fields.get_usize(Some("y"), "k"), Some(2));
        assert_eq!(fields.get_usize(Some("z"), "k"), None);
        assert_eq!(fields.get_usize(None, "a"), None);
        assert_eq!(fields.get_array(None, "v"), Some(vec![1.0, 2.5, 3e-3]));
        // Unterminated array.
        assert_eq!(fields.get_array(None, "w"), None);
        // Arrays are not scalars.
        assert_eq!(fields.get_f64(None, "v"), None);
        assert!(fields.require_f64(None, "b").is_err());
    }

    #[test]
    fn writes_lines() {
        let mut out = Vec::new();
        {
            let mut writer = FieldWriter::new(&mut out, "data").unwrap();
            writer.write_f64("a", 0.1, "lower bound").unwrap();
            writer.write_usize("x.n", 4, "intervals").unwrap();
            writer.write_array("w", &[1.0, -2.5], "weights").unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "data.a = 0.1; % lower bound\n\
             data.x.n = 4; % intervals\n\
             data.w = [1.0,-2.5]; % weights\n"
        );
    }

    #[test]
    fn path_budget() {
        let long = "p".repeat(PATH_BUDGET - 1);
        assert!(FieldWriter::new(Vec::new(), &long).is_none());
        let fits = "p".repeat(PATH_BUDGET - 2);
        assert!(FieldWriter::new(Vec::new(), &fits).is_some());
    }
}
