use super::{is_excluded, run_tool, ServiceError, WindowFocuser, WindowInfo, WindowLister};

const OSASCRIPT: &str = "osascript";

const LIST_SCRIPT: &str = r#"tell application "System Events" to get name of every application process whose background only is false"#;

/// macOS backend driven through AppleScript. Windows are identified by their
/// application name, which doubles as the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacDesktop;

impl WindowLister for MacDesktop {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        let out = run_tool(OSASCRIPT, &["-e", LIST_SCRIPT])?;
        Ok(parse_process_names(&out, exclude_title))
    }
}

impl WindowFocuser for MacDesktop {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::WindowNotFound(id.to_string()));
        }
        let script = format!(r#"tell application "{}" to activate"#, quote(id));
        run_tool(OSASCRIPT, &["-e", &script]).map(|_| ())
    }
}

/// Escape for an AppleScript string literal.
fn quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// osascript prints lists as `a, b, c`.
fn parse_process_names(out: &str, exclude_title: &str) -> Vec<WindowInfo> {
    out.trim()
        .split(", ")
        .map(str::trim)
        .filter(|name| !is_excluded(name, exclude_title))
        .map(|name| WindowInfo::new(name, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_process_list() {
        let windows = parse_process_names("Finder, Safari, AutoType, Terminal\n", "autotype");
        let names: Vec<_> = windows.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(names, ["Finder", "Safari", "Terminal"]);
        assert!(parse_process_names("\n", "autotype").is_empty());
    }

    #[test]
    fn app_names_are_quoted() {
        assert_eq!(quote(r#"Say "hi""#), r#"Say \"hi\""#);
        assert_eq!(quote(r"back\slash"), r"back\\slash");
    }
}
