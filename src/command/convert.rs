use super::pattern::ParamKind;

/// A converted placeholder value, tagged with its source kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Float(f32),
    UInt(u32),
}

/// The ordered placeholder values handed to a handler. Accessors check both
/// position and kind so a handler indexing past its own pattern surfaces as
/// an error envelope instead of silent misbehavior.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    /// Converts raw placeholder tokens per kind. Numeric conversion is
    /// lenient: a token that fails to parse becomes `0.0` / `0`, matching
    /// the observable behavior of the original handlers.
    pub fn convert(kinds: &[ParamKind], raw: &[String]) -> Args {
        let values = kinds
            .iter()
            .zip(raw.iter())
            .map(|(kind, token)| match kind {
                ParamKind::Str => Arg::Str(token.clone()),
                ParamKind::Float => Arg::Float(token.parse().unwrap_or(0.0)),
                ParamKind::UInt => Arg::UInt(token.parse().unwrap_or(0)),
            })
            .collect();
        Args { values }
    }

    pub fn str_at(&self, index: usize) -> Result<&str, String> {
        match self.values.get(index) {
            Some(Arg::Str(value)) => Ok(value),
            Some(other) => Err(mismatch(index, "a string", other)),
            None => Err(missing(index)),
        }
    }

    pub fn float_at(&self, index: usize) -> Result<f32, String> {
        match self.values.get(index) {
            Some(Arg::Float(value)) => Ok(*value),
            Some(other) => Err(mismatch(index, "a float", other)),
            None => Err(missing(index)),
        }
    }

    pub fn uint_at(&self, index: usize) -> Result<u32, String> {
        match self.values.get(index) {
            Some(Arg::UInt(value)) => Ok(*value),
            Some(other) => Err(mismatch(index, "an unsigned integer", other)),
            None => Err(missing(index)),
        }
    }
}

fn kind_name(arg: &Arg) -> &'static str {
    match arg {
        Arg::Str(_) => "a string",
        Arg::Float(_) => "a float",
        Arg::UInt(_) => "an unsigned integer",
    }
}

fn mismatch(index: usize, wanted: &str, got: &Arg) -> String {
    format!(
        "handler expected {wanted} at argument {index}, pattern supplied {}",
        kind_name(got)
    )
}

fn missing(index: usize) -> String {
    format!("handler expected an argument at position {index}, pattern has none")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn converts_by_kind() {
        let args = Args::convert(
            &[ParamKind::Str, ParamKind::Float, ParamKind::UInt],
            &raw(&["Cube_0", "-1.5", "255"]),
        );
        assert_eq!(args.str_at(0).expect("str"), "Cube_0");
        assert_eq!(args.float_at(1).expect("float"), -1.5);
        assert_eq!(args.uint_at(2).expect("uint"), 255);
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let args = Args::convert(
            &[ParamKind::Float, ParamKind::UInt],
            &raw(&["not-a-number", "-3"]),
        );
        assert_eq!(args.float_at(0).expect("float"), 0.0);
        assert_eq!(args.uint_at(1).expect("uint"), 0);
    }

    #[test]
    fn misindexing_is_reported_not_silent() {
        let args = Args::convert(&[ParamKind::Str], &raw(&["Cube_0"]));
        assert!(args.float_at(0).expect_err("kind mismatch").contains("float"));
        assert!(args.str_at(1).expect_err("out of range").contains("position 1"));
    }
}
