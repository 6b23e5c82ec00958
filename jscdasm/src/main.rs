use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::info;
use std::path::{Path, PathBuf};

use jscdasm_core::{
    engine::{self, EngineSession, DEFAULT_FLAGS},
    format::{CacheBlob, HeaderSchema},
};

/// Recover disassembly from a V8 code cache blob by re-stamping its
/// version/source/flag hashes with values from the running engine and
/// replaying it through the consume-code-cache path.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Code cache blob to disassemble (e.g. a .jsc file).
    input: PathBuf,

    /// TOML file overriding the validated header range (`offset` / `len`)
    /// for engine builds with a different cache layout.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Extra engine flags appended to the defaults. Flags that affect code
    /// generation must match the build that produced the blob; they cannot
    /// be fixed up by header patching.
    #[arg(long, allow_hyphen_values = true)]
    extra_flags: Option<String>,

    /// Skip the snapshot checksum check of newer engine builds.
    #[arg(long)]
    no_verify_snapshot_checksum: bool,
}

fn flag_string(args: &Args) -> String {
    let mut flags = String::from(DEFAULT_FLAGS);
    if args.no_verify_snapshot_checksum {
        flags.push_str(" --no-verify-snapshot-checksum");
    }
    if let Some(extra) = &args.extra_flags {
        flags.push(' ');
        flags.push_str(extra);
    }
    flags
}

fn load_schema(path: Option<&Path>) -> Result<HeaderSchema> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read schema file {:?}", path))?;
            let schema =
                toml::from_str(&text).with_context(|| format!("parse schema file {:?}", path))?;
            Ok(schema)
        }
        None => Ok(HeaderSchema::default()),
    }
}

fn disassemble(blob: &mut CacheBlob, schema: &HeaderSchema) -> Result<()> {
    let mut session = EngineSession::new();

    let reference = session
        .reference_header(schema)
        .context("harvest reference header from the running engine")?;
    blob.patch_header(&reference, schema)?;

    session.load_cache(blob, schema).context(
        "the engine did not consume the patched cache; \
         check --schema offsets and codegen flags against the producing build",
    )?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let schema = load_schema(args.schema.as_deref())?;
    let mut blob = CacheBlob::from_file(&args.input)
        .with_context(|| format!("read cache blob {:?}", args.input))?;
    info!("loaded {} byte blob from {:?}", blob.len(), args.input);

    // Reject malformed input before the engine is even brought up.
    blob.header(&schema)
        .context("target blob cannot hold the validated header range")?;

    engine::init(&flag_string(&args));
    let result = disassemble(&mut blob, &schema);

    // The session created in disassemble() is gone by now; tear down the
    // engine exactly once whether or not the load succeeded.
    engine::shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["jscdasm", "blob.jsc"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn default_flag_string() {
        assert_eq!(flag_string(&args(&[])), DEFAULT_FLAGS);
    }

    #[test]
    fn operator_flags_are_appended() {
        let args = args(&[
            "--no-verify-snapshot-checksum",
            "--extra-flags",
            "--jitless",
        ]);
        assert_eq!(
            flag_string(&args),
            format!("{} --no-verify-snapshot-checksum --jitless", DEFAULT_FLAGS)
        );
    }

    #[test]
    fn schema_defaults_without_a_file() {
        assert_eq!(load_schema(None).unwrap(), HeaderSchema::default());
    }

    #[test]
    fn schema_file_overrides_the_layout() {
        let dir = std::env::temp_dir();
        let path = dir.join("jscdasm-schema-test.toml");
        std::fs::write(&path, "offset = 8\nlen = 16\n").unwrap();
        let schema = load_schema(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(schema, HeaderSchema { offset: 8, len: 16 });
    }
}
