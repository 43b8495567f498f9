//! Shared helpers for the black-box specs

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

/// Fetch stand-in: writes the file named by the `-o` template
pub const FETCH_OK: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --) shift; break ;;
    *) shift ;;
  esac
done
file=$(printf '%s' "$out" | sed 's/%(ext)s/mp3/')
printf 'ID3fake-audio' > "$file"
"#;

/// Fetch stand-in for a source behind a sign-in wall
pub const FETCH_AUTH: &str = r#"#!/bin/sh
echo "ERROR: [youtube] abc: Sign in to confirm you're not a bot" >&2
exit 1
"#;

/// Transcode stand-in: copies the `-i` input to the last argument
pub const TRANSCODE_OK: &str = r#"#!/bin/sh
in=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    *) out="$1"; shift ;;
  esac
done
cp "$in" "$out"
"#;

/// Separation stand-in with the spleeter 2-stem layout
pub const SEPARATE_OK: &str = r#"#!/bin/sh
dir=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) dir="$2"; shift 2 ;;
    -p) shift 2 ;;
    separate) shift ;;
    *) input="$1"; shift ;;
  esac
done
name=$(basename "$input")
name="${name%.*}"
mkdir -p "$dir/$name"
printf 'RIFFvocals' > "$dir/$name/vocals.wav"
printf 'RIFFbacking' > "$dir/$name/accompaniment.wav"
"#;

/// A scratch deployment: state dir, config file and stub tools
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// No config file; the daemon would run with defaults
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Stub tools wired through `fx.toml`, plus any extra TOML
    pub fn with_tools(fetch: &str, extra: &str) -> Self {
        let project = Self::empty();
        let fetch = project.script("bin/yt-dlp", fetch);
        let transcode = project.script("bin/ffmpeg", TRANSCODE_OK);
        let separate = project.script("bin/spleeter", SEPARATE_OK);
        project.file(
            "fx.toml",
            &format!(
                "{extra}\n\
                 [storage]\nartifact_root = \"downloads\"\nupload_root = \"uploads\"\n\n\
                 [fetch]\nprogram = \"{}\"\ntimeout = \"20s\"\n\n\
                 [transcode]\nprogram = \"{}\"\ntimeout = \"20s\"\n\n\
                 [separate]\nprogram = \"{}\"\ntimeout = \"20s\"\n",
                fetch.display(),
                transcode.display(),
                separate.display(),
            ),
        );
        project
    }

    /// Working stub tools and default policy
    pub fn ready() -> Self {
        Self::with_tools(FETCH_OK, "")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn script(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.file(rel, body);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("fx").unwrap();
        cmd.current_dir(self.path())
            .env("FX_STATE_DIR", self.state_dir())
            .env("FX_DAEMON_BINARY", assert_cmd::cargo::cargo_bin("fxd"))
            .env("FX_TIMEOUT_CONNECT_MS", "10000")
            .env("FX_TIMEOUT_SUBMIT_MS", "60000")
            .env_remove("FX_SOCKET_PATH")
            .env_remove("RUST_LOG");
        let config = self.path().join("fx.toml");
        if config.exists() {
            cmd.env("FX_CONFIG", config);
        } else {
            cmd.env_remove("FX_CONFIG");
        }
        cmd
    }

    pub fn fx(&self) -> CliBuilder {
        CliBuilder {
            cmd: self.command(),
        }
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        // Never leave a daemon behind
        let _ = self.command().arg("shutdown").output();
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct RunAssert {
    assert: assert_cmd::assert::Assert,
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        Self {
            assert: self.assert.stdout(contains(needle)),
        }
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        Self {
            assert: self.assert.stderr(contains(needle)),
        }
    }

    pub fn output(&self) -> &Output {
        self.assert.get_output()
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output().stdout).unwrap()
    }
}
