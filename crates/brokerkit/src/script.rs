//! PowerShell script construction.
//!
//! Every value that reaches a script goes through [`quote`], so user input
//! is always a single-quoted literal and never evaluated.

/// Quote a string as a PowerShell single-quoted literal.
///
/// PowerShell treats the typographic single quotes as quote characters too,
/// so they are doubled along with `'`.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Quote a name so cmdlets with wildcard-aware `-Name` match it literally.
pub fn literal_name(value: &str) -> String {
    format!("([WildcardPattern]::Escape({}))", quote(value))
}

fn boolean(value: bool) -> &'static str {
    if value { "$true" } else { "$false" }
}

/// A single cmdlet call with named parameters.
#[derive(Debug, Clone)]
pub struct Invocation {
    cmdlet: &'static str,
    params: Vec<(&'static str, String)>,
}

impl Invocation {
    pub fn new(cmdlet: &'static str) -> Self {
        Self {
            cmdlet,
            params: Vec::new(),
        }
    }

    /// Add a string parameter
    pub fn string(mut self, name: &'static str, value: &str) -> Self {
        self.params.push((name, quote(value)));
        self
    }

    /// Add a string parameter if present
    pub fn opt_string(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.string(name, v),
            None => self,
        }
    }

    /// Add a numeric parameter
    pub fn number(mut self, name: &'static str, value: u64) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Add a boolean parameter if present
    pub fn opt_bool(mut self, name: &'static str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            self.params.push((name, boolean(v).to_string()));
        }
        self
    }

    /// Add a parameter whose value is an already-safe expression
    pub fn expression(mut self, name: &'static str, expression: String) -> Self {
        self.params.push((name, expression));
        self
    }

    /// Render as PowerShell source
    pub fn render(&self) -> String {
        let mut rendered = self.cmdlet.to_string();
        for (name, value) in &self.params {
            rendered.push_str(" -");
            rendered.push_str(name);
            rendered.push(' ');
            rendered.push_str(value);
        }
        rendered
    }
}

/// Pipe a pipeline's output to compact JSON, emitting nothing when it is empty.
pub fn emit_json(pipeline: &str) -> String {
    format!("$result = {pipeline}; if ($result) {{ $result | ConvertTo-Json -Compress -Depth 3 }}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("Notepad"), "'Notepad'");
        assert_eq!(quote(r"C:\Windows\notepad.exe"), r"'C:\Windows\notepad.exe'");
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(quote("it\u{2019}s"), "'it\u{2019}\u{2019}s'");
    }

    #[test]
    fn test_quote_leaves_variables_inert() {
        // Inside single quotes `$` has no meaning; nothing to escape.
        assert_eq!(quote("$(Remove-Item C:\\)"), "'$(Remove-Item C:\\)'");
    }

    #[test]
    fn test_invocation_render() {
        let rendered = Invocation::new("Set-BrokerApplication")
            .string("CommandLineArguments", "/A")
            .opt_string("Description", None)
            .opt_bool("Enabled", Some(false))
            .number("Uid", 7)
            .render();

        assert_eq!(
            rendered,
            "Set-BrokerApplication -CommandLineArguments '/A' -Enabled $false -Uid 7"
        );
    }

    #[test]
    fn test_emit_json() {
        assert_eq!(
            emit_json("Get-BrokerIcon -Uid 1"),
            "$result = Get-BrokerIcon -Uid 1; if ($result) { $result | ConvertTo-Json -Compress -Depth 3 }"
        );
    }
}
