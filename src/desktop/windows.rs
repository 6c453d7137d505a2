use super::{is_excluded, run_tool, ServiceError, WindowFocuser, WindowInfo, WindowLister};

const POWERSHELL: &str = "powershell";

const LIST_SCRIPT: &str = "Get-Process | Where-Object { $_.MainWindowTitle } | \
ForEach-Object { \"$($_.Id)`t$($_.MainWindowTitle)\" }";

/// Window control through PowerShell. Window ids are process ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsDesktop;

impl WindowsDesktop {
    fn run(script: &str) -> Result<String, ServiceError> {
        run_tool(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", script])
    }
}

impl WindowLister for WindowsDesktop {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        let out = Self::run(LIST_SCRIPT)?;
        Ok(parse_process_list(&out, exclude_title))
    }
}

impl WindowFocuser for WindowsDesktop {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        let pid: u32 = id
            .parse()
            .map_err(|_| ServiceError::WindowNotFound(id.to_string()))?;
        let script = format!(
            "$ws = New-Object -ComObject WScript.Shell; if (-not $ws.AppActivate({pid})) {{ exit 1 }}"
        );
        Self::run(&script).map(|_| ())
    }
}

/// Lines of `<pid>\t<title>`.
fn parse_process_list(out: &str, exclude_title: &str) -> Vec<WindowInfo> {
    out.lines()
        .filter_map(|line| {
            let (pid, title) = line.split_once('\t')?;
            let pid = pid.trim();
            let title = title.trim();
            if pid.parse::<u32>().is_err() || is_excluded(title, exclude_title) {
                return None;
            }
            Some(WindowInfo::new(pid, title))
        })
        .collect()
}
