//! Process control adapters used to restart the compositor.
//!
//! | Module    | OS      | API used                                          |
//! |-----------|---------|---------------------------------------------------|
//! | `windows` | Windows | `CreateToolhelp32Snapshot` + `TerminateProcess`   |
//! | `mock`    | any     | Records terminations in memory                    |

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::ToolhelpProcessControl as NativeProcessControl;

/// Compares an executable file name against a configured process name.
///
/// Case-insensitive, and a trailing `.exe` on either side is ignored, so
/// `"dwm"`, `"dwm.exe"` and `"DWM.EXE"` all match each other.
pub fn process_name_matches(exe_file: &str, wanted: &str) -> bool {
    strip_exe(exe_file).eq_ignore_ascii_case(strip_exe(wanted))
}

fn strip_exe(name: &str) -> &str {
    let trimmed = name.trim();
    match trimmed.len().checked_sub(4) {
        Some(split) if trimmed.is_char_boundary(split)
            && trimmed[split..].eq_ignore_ascii_case(".exe") =>
        {
            &trimmed[..split]
        }
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_with_or_without_extension() {
        assert!(process_name_matches("dwm.exe", "dwm"));
        assert!(process_name_matches("dwm", "dwm.exe"));
        assert!(process_name_matches("DWM.EXE", "dwm.exe"));
    }

    #[test]
    fn test_name_does_not_match_other_processes() {
        assert!(!process_name_matches("dwmhelper.exe", "dwm.exe"));
        assert!(!process_name_matches("explorer.exe", "dwm"));
        assert!(!process_name_matches(".exe", "dwm"));
    }
}
