//! Decoders for the raw argument buffers the kernel exposes per process.
//!
//! Two layouts are handled:
//!
//! - macOS `sysctl(KERN_PROCARGS2)`: a native-endian `i32` argument count,
//!   the executable path (NUL-terminated), NUL padding up to the argument
//!   block, then `argc` NUL-terminated argument strings. The environment
//!   follows the arguments in the same buffer and is ignored here.
//! - Linux `/proc/<pid>/cmdline`: NUL-separated arguments with no header.
//!
//! Both decoders are total: malformed or truncated input decodes as far as it
//! is well-formed and never reads past the end of the slice.

const ARGC_LEN: usize = std::mem::size_of::<i32>();

/// Decoded `KERN_PROCARGS2` buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcArgs {
    /// Path the kernel recorded for the executable image.
    pub exec_path: Option<String>,
    /// Argument vector, `argv[0]` first.
    pub args: Vec<String>,
}

impl ProcArgs {
    /// Arguments joined with single spaces, as used for signature matching.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Decode a `KERN_PROCARGS2` buffer.
pub fn decode_procargs(buf: &[u8]) -> ProcArgs {
    let Some(header) = buf.get(..ARGC_LEN) else {
        return ProcArgs::default();
    };
    let argc = i32::from_ne_bytes([header[0], header[1], header[2], header[3]]);
    let argc = usize::try_from(argc).unwrap_or(0);
    let body = &buf[ARGC_LEN..];

    let (exec_path, mut pos) = match memchr_nul(body, 0) {
        Some(end) => (lossy(&body[..end]), end + 1),
        // Path runs to the end of the buffer: nothing else to read.
        None => {
            return ProcArgs {
                exec_path: non_empty(lossy(body)),
                args: Vec::new(),
            }
        }
    };

    while pos < body.len() && body[pos] == 0 {
        pos += 1;
    }

    let mut args = Vec::with_capacity(argc.min(64));
    while args.len() < argc && pos < body.len() {
        let end = memchr_nul(body, pos).unwrap_or(body.len());
        args.push(lossy(&body[pos..end]));
        pos = end + 1;
    }

    ProcArgs {
        exec_path: non_empty(exec_path),
        args,
    }
}

/// Decode a NUL-separated argument list such as `/proc/<pid>/cmdline`.
pub fn split_nul_args(buf: &[u8]) -> Vec<String> {
    let trimmed = buf.strip_suffix(b"\0").unwrap_or(buf);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(|b| *b == 0).map(lossy).collect()
}

fn memchr_nul(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .iter()
        .position(|b| *b == 0)
        .map(|offset| from + offset)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procargs(argc: i32, exec: &str, padding: usize, args: &[&str]) -> Vec<u8> {
        let mut buf = argc.to_ne_bytes().to_vec();
        buf.extend_from_slice(exec.as_bytes());
        buf.push(0);
        buf.extend(std::iter::repeat(0).take(padding));
        for arg in args {
            buf.extend_from_slice(arg.as_bytes());
            buf.push(0);
        }
        buf
    }

    #[test]
    fn decodes_well_formed_buffer() {
        let buf = procargs(
            3,
            "/usr/local/bin/node",
            5,
            &["node", "/usr/local/bin/claude", "--resume"],
        );
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.exec_path.as_deref(), Some("/usr/local/bin/node"));
        assert_eq!(
            decoded.args,
            vec!["node", "/usr/local/bin/claude", "--resume"]
        );
        assert_eq!(
            decoded.command_line(),
            "node /usr/local/bin/claude --resume"
        );
    }

    #[test]
    fn stops_at_argc_and_ignores_environment() {
        let buf = procargs(1, "/bin/zsh", 2, &["-zsh", "HOME=/Users/me", "TERM=xterm"]);
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.args, vec!["-zsh"]);
    }

    #[test]
    fn empty_buffer_is_empty_result() {
        assert_eq!(decode_procargs(&[]), ProcArgs::default());
        assert_eq!(decode_procargs(&[1, 0]), ProcArgs::default());
    }

    #[test]
    fn header_only_has_no_path() {
        let decoded = decode_procargs(&2i32.to_ne_bytes());
        assert_eq!(decoded, ProcArgs::default());
    }

    #[test]
    fn truncated_path_is_kept() {
        let mut buf = 2i32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"/usr/bi");
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.exec_path.as_deref(), Some("/usr/bi"));
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn truncated_last_argument_is_kept() {
        let mut buf = procargs(3, "/bin/python3", 1, &["python3"]);
        buf.extend_from_slice(b"aider --mo");
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.args, vec!["python3", "aider --mo"]);
    }

    #[test]
    fn negative_argc_yields_no_arguments() {
        let buf = procargs(-4, "/bin/sh", 1, &["sh", "-c"]);
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.exec_path.as_deref(), Some("/bin/sh"));
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn argc_larger_than_buffer_is_bounded() {
        let buf = procargs(1000, "/bin/sh", 0, &["sh"]);
        assert_eq!(decode_procargs(&buf).args, vec!["sh"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut buf = 1i32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"/bin/x\0\0");
        buf.extend_from_slice(&[0x66, 0xff, 0x6f, 0]);
        let decoded = decode_procargs(&buf);
        assert_eq!(decoded.args, vec!["f\u{fffd}o"]);
    }

    #[test]
    fn split_cmdline_drops_trailing_nul() {
        assert_eq!(
            split_nul_args(b"node\0/usr/bin/codex\0exec\0"),
            vec!["node", "/usr/bin/codex", "exec"]
        );
    }

    #[test]
    fn split_cmdline_keeps_empty_inner_arguments() {
        assert_eq!(split_nul_args(b"sh\0\0-c\0"), vec!["sh", "", "-c"]);
    }

    #[test]
    fn split_cmdline_handles_rewritten_titles() {
        assert_eq!(
            split_nul_args(b"postgres: checkpointer"),
            vec!["postgres: checkpointer"]
        );
        assert!(split_nul_args(b"").is_empty());
        assert!(split_nul_args(b"\0").is_empty());
    }
}
