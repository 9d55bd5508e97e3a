use anyhow::Result;
use serde::Serialize;

use harvest_core::matrix::default_target_matrix;

/// One row of the target listing.
#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub key: String,
    pub toolchain: String,
    pub arch: String,
    pub bits: u32,
    pub dialect: String,
    pub opt: String,
    pub pic: bool,
}

/// List the compilation targets in the default matrix.
pub fn targets_command(json: bool) -> Result<()> {
    let matrix = default_target_matrix();
    let entries: Vec<TargetInfo> = matrix
        .iter()
        .map(|(key, desc)| TargetInfo {
            key: key.clone(),
            toolchain: desc.toolchain.as_str().to_string(),
            arch: desc.arch.as_str().to_string(),
            bits: desc.bits.as_u32(),
            dialect: desc.dialect.as_str().to_string(),
            opt: desc.opt.as_str().to_string(),
            pic: desc.pic,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Targets ({}):", entries.len());
    for entry in entries {
        let pic = if entry.pic { " PIC" } else { "" };
        println!(
            "- {}: {} {} {}-bit {} -O{}{}",
            entry.key, entry.toolchain, entry.arch, entry.bits, entry.dialect, entry.opt, pic
        );
    }

    Ok(())
}
