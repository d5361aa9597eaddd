// CLASSIFICATION: COMMUNITY
// Filename: rdwr_main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! `rdwr_test`: issue a single read(2) or write(2) against a device file.
//!
//! ```text
//! rdwr_test opt device_file num_bytes
//!   opt = 0  read up to num_bytes and print them
//!   opt = 1  write num_bytes zero bytes
//! ```
//!
//! Arguments are validated completely before the file is opened.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use log::debug;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "rdwr_test", about = "Read/write test bed for demo drivers", version = "0.1")]
pub struct Cli {
    /// 0 issues a read, 1 issues a write
    #[arg(allow_negative_numbers = true)]
    pub opt: String,
    /// Device (or regular) file to open
    pub device_file: PathBuf,
    /// Bytes to read or write
    #[arg(allow_negative_numbers = true)]
    pub num_bytes: String,
    /// Pause after the I/O until the process is signalled
    #[arg(long)]
    pub stay_alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opt {
    Read,
    Write,
}

impl Opt {
    fn mode(self) -> &'static str {
        match self {
            Opt::Read => "read-only",
            Opt::Write => "write-only",
        }
    }
}

/// A validated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub opt: Opt,
    pub device: PathBuf,
    pub num_bytes: usize,
    pub stay_alive: bool,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("bad arguments")]
    Usage,
    /// `--help` or `--version` output; not a failure.
    #[error("{0}")]
    Info(String),
    #[error("number of bytes '{0}' invalid.")]
    InvalidCount(String),
    #[error("open: {0}")]
    Open(#[source] io::Error),
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("{prog}: out of memory!")]
    OutOfMemory { prog: String },
    #[error(transparent)]
    Output(#[from] io::Error),
}

impl HarnessError {
    /// Errors raised before any file was touched.
    pub fn is_usage(&self) -> bool {
        matches!(self, HarnessError::Usage | HarnessError::InvalidCount(_))
    }
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} opt=read/write device_file num_bytes_to_read_or_write\n \
         opt = '0' => we shall issue the read(2)\n \
         opt = '1' => we shall issue the write(2)\n"
    )
}

impl TryFrom<Cli> for Request {
    type Error = HarnessError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let opt = match cli.opt.trim().parse::<i64>() {
            Ok(0) => Opt::Read,
            Ok(1) => Opt::Write,
            _ => return Err(HarnessError::Usage),
        };
        let num_bytes = cli
            .num_bytes
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| (0..=i64::from(i32::MAX)).contains(n))
            .ok_or_else(|| HarnessError::InvalidCount(cli.num_bytes.clone()))?;
        Ok(Request {
            opt,
            device: cli.device_file,
            num_bytes: num_bytes as usize,
            stay_alive: cli.stay_alive,
        })
    }
}

/// Parse a full argv (program name first) into a request.
pub fn parse_args<I, T>(args: I) -> Result<Request, HarnessError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            HarnessError::Info(e.render().to_string())
        }
        _ => HarnessError::Usage,
    })?;
    Request::try_from(cli)
}

/// Zero-filled I/O buffer of `len` bytes. Allocation failure is reported
/// instead of aborting.
pub fn io_buffer(prog: &str, len: usize) -> Result<Vec<u8>, HarnessError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| HarnessError::OutOfMemory { prog: prog.to_string() })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Open the file and perform the single read or write. Returns the byte
/// count the system call reported.
pub fn execute(req: &Request, prog: &str, out: &mut dyn Write) -> Result<usize, HarnessError> {
    let mut file: File = match req.opt {
        Opt::Read => File::open(&req.device),
        Opt::Write => OpenOptions::new().write(true).open(&req.device),
    }
    .map_err(HarnessError::Open)?;
    writeln!(
        out,
        "Device file \"{}\" opened (in {} mode)",
        req.device.display(),
        req.opt.mode()
    )?;

    let mut buf = io_buffer(prog, req.num_bytes)?;
    match req.opt {
        Opt::Read => {
            let n = file.read(&mut buf).map_err(HarnessError::Read)?;
            writeln!(out, "{}: read {} bytes from {}", prog, n, req.device.display())?;
            writeln!(out, " Data read:\n\"{}\"", String::from_utf8_lossy(&buf[..n]))?;
            Ok(n)
        }
        Opt::Write => {
            let n = file.write(&buf).map_err(HarnessError::Write)?;
            writeln!(out, "{}: wrote {} bytes to {}", prog, n, req.device.display())?;
            Ok(n)
        }
    }
}

/// Run the harness on `args`, writing results to `out` and diagnostics to
/// `err`. Returns the process exit status.
pub fn run<I, T>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let prog = args
        .first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rdwr_test".into());

    let req = match parse_args(&args) {
        Ok(req) => req,
        Err(HarnessError::Info(text)) => {
            let _ = write!(out, "{}", text);
            return 0;
        }
        Err(HarnessError::InvalidCount(n)) => {
            let _ = writeln!(err, "{}: number of bytes '{}' invalid.", prog, n);
            return 1;
        }
        Err(_) => {
            let _ = write!(err, "{}", usage(&prog));
            return 1;
        }
    };
    debug!("rdwr_test request: {:?}", req);

    if let Err(e) = execute(&req, &prog, out) {
        let _ = writeln!(err, "{}", e);
        if matches!(e, HarnessError::Read(_) | HarnessError::Write(_)) {
            let _ = writeln!(err, "Tip: see kernel log");
        }
        return 1;
    }

    if req.stay_alive {
        let _ = writeln!(out, "{}:{}: stayin' alive (in pause()) ... ", prog, std::process::id());
        let _ = out.flush();
        loop {
            std::thread::park();
        }
    }
    0
}
