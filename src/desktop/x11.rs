use super::{is_excluded, run_tool, ServiceError, WindowFocuser, WindowInfo, WindowLister};

const WMCTRL: &str = "wmctrl";

/// X11 window control through `wmctrl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct X11Desktop;

impl WindowLister for X11Desktop {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        let out = run_tool(WMCTRL, &["-l"])?;
        Ok(parse_wmctrl_list(&out, exclude_title))
    }
}

impl WindowFocuser for X11Desktop {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        if !is_window_id(id) {
            return Err(ServiceError::WindowNotFound(id.to_string()));
        }
        run_tool(WMCTRL, &["-i", "-a", id]).map(|_| ())
    }
}

fn is_window_id(id: &str) -> bool {
    id.strip_prefix("0x")
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse `wmctrl -l` output: `<id> <desktop> <host> <title...>`.
///
/// Sticky windows (desktop `-1`: panels, docks) are skipped.
fn parse_wmctrl_list(out: &str, exclude_title: &str) -> Vec<WindowInfo> {
    out.lines()
        .filter_map(|line| {
            let mut rest = line.trim_start();
            let mut fields = [""; 3];
            for field in fields.iter_mut() {
                let end = rest.find(char::is_whitespace)?;
                *field = &rest[..end];
                rest = rest[end..].trim_start();
            }
            let [id, desktop, _host] = fields;
            let title = rest.trim_end();

            if desktop == "-1" || is_excluded(title, exclude_title) {
                return None;
            }
            Some(WindowInfo::new(id, title))
        })
        .collect()
}
