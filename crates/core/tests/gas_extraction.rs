use harvest_core::extract::{extract_gas_function, strategy_for, AsmProfile, ExtractionStrategy};
use harvest_core::target::{Arch, BitWidth, Dialect, OptLevel, TargetDescriptor, Toolchain};

fn gas_target(toolchain: Toolchain, arch: Arch, bits: BitWidth) -> TargetDescriptor {
    TargetDescriptor::new(toolchain, arch, bits, Dialect::Gas, OptLevel::O0, false)
        .expect("valid target")
}

#[test]
fn gcc_x86_extraction_splits_a_two_function_dump() {
    let dump = concat!(
        "\t.file\t\"point.c\"\n",
        "\t.text\n",
        "\t.globl\tscale\n",
        "\t.type\tscale, @function\n",
        "scale:\n",
        ".LFB0:\n",
        "\t.cfi_startproc\n",
        "\tpushq\t%rbp\n",
        "\t.cfi_def_cfa_offset 16\n",
        "\tmovq\t%rsp, %rbp\n",
        "\tmovl\t%edi, -4(%rbp)\t# x, x\n",
        "\t# spill slot note\n",
        "\tmovl\t-4(%rbp), %eax\n",
        "\taddl\t%eax, %eax\n",
        "\tpopq\t%rbp\n",
        "\tret\n",
        "\t.cfi_endproc\n",
        ".LFE0:\n",
        "\t.size\tscale, .-scale\n",
        "\t.globl\tshift\n",
        "\t.type\tshift, @function\n",
        "shift:\n",
        "\t.cfi_startproc\n",
        "\tret\n",
        "\t.cfi_endproc\n",
        "\t.size\tshift, .-shift\n",
        "\t.ident\t\"GCC: (Debian 12.2.0-14) 12.2.0\"\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.warnings.is_empty());

    // Body: synthetic header, then label through the epilogue marker.
    assert!(segments.body.starts_with(".globl scale\n.type scale, @function\nscale:\n.LFB0:\n"));
    assert!(segments.body.ends_with("\tret\n\t.cfi_endproc\n"));
    assert!(segments.body.contains("\tpushq\t%rbp\n"));

    // Comments are stripped from the body, not from the context segments.
    assert!(segments.body.contains("\tmovl\t%edi, -4(%rbp)"));
    assert!(!segments.body.contains("# x, x"));
    assert!(!segments.body.contains("spill slot note"));

    // The pre context keeps the type directive but not the restated
    // visibility the synthetic header already provides.
    assert!(segments.pre.contains("\t.file\t\"point.c\"\n"));
    assert!(segments.pre.contains("\t.type\tscale, @function\n"));
    assert!(!segments.pre.contains(".globl"));

    // Everything after the close, including the sibling function, is post.
    assert!(segments.post.starts_with(".LFE0:\n"));
    assert!(segments.post.contains("shift:\n"));
    assert!(segments.post.contains("\t.ident\t"));

    for segment in [&segments.pre, &segments.body, &segments.post] {
        assert!(segment.ends_with('\n'));
    }
}

#[test]
fn gcc_x86_extraction_keeps_a_sibling_defined_before_the_target_in_pre() {
    let dump = concat!(
        "\t.file\t\"point.c\"\n",
        "\t.text\n",
        "\t.globl\tgrow\n",
        "\t.type\tgrow, @function\n",
        "grow:\n",
        ".LFB0:\n",
        "\t.cfi_startproc\n",
        "\tmovl\t%edi, %eax\n",
        "\taddl\t$1, %eax\n",
        "\tret\n",
        "\t.cfi_endproc\n",
        ".LFE0:\n",
        "\t.size\tgrow, .-grow\n",
        "\t.globl\tscale\n",
        "\t.type\tscale, @function\n",
        "scale:\n",
        ".LFB1:\n",
        "\t.cfi_startproc\n",
        "\tleal\t(%rdi,%rdi), %eax\n",
        "\tret\n",
        "\t.cfi_endproc\n",
        ".LFE1:\n",
        "\t.size\tscale, .-scale\n",
        "\t.ident\t\"GCC: (Debian 12.2.0-14) 12.2.0\"\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.warnings.is_empty());

    // The whole earlier sibling stays in pre: label, body, and its own
    // visibility directive. Its epilogue marker closes nothing because the
    // region has not opened yet.
    assert!(segments.pre.contains("\t.globl\tgrow\n"));
    assert!(segments.pre.contains("grow:\n"));
    assert!(segments.pre.contains("\taddl\t$1, %eax\n"));
    assert!(segments.pre.contains("\t.cfi_endproc\n"));

    // Only the target's visibility line is deduplicated against the
    // synthetic header.
    assert!(!segments.pre.contains("\t.globl\tscale"));
    assert!(segments.pre.ends_with("\t.type\tscale, @function\n"));

    assert_eq!(
        segments.body,
        concat!(
            ".globl scale\n",
            ".type scale, @function\n",
            "scale:\n",
            ".LFB1:\n",
            "\t.cfi_startproc\n",
            "\tleal\t(%rdi,%rdi), %eax\n",
            "\tret\n",
            "\t.cfi_endproc\n",
        )
    );

    // Post picks up at the target's own trailer; no sibling text leaks
    // forward past the label.
    assert!(segments.post.starts_with(".LFE1:\n\t.size\tscale, .-scale\n"));
    assert!(!segments.body.contains("grow"));
    assert!(!segments.post.contains("grow"));
}

#[test]
fn arm_dumps_seed_arm_spelled_directives_and_strip_at_comments() {
    let dump = concat!(
        "\t.arch armv8-a\n",
        "\t.text\n",
        "\t.align\t2\n",
        "\t.global\tscale\n",
        "\t.type\tscale, %function\n",
        "scale:\n",
        "\t.cfi_startproc\n",
        "\tadd\tw0, w0, w0\t@ tmp117\n",
        "\tret\n",
        "\t.cfi_endproc\n",
        "\t.size\tscale, .-scale\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::Arm, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.body.starts_with(".global scale\n.type scale, %function\nscale:\n"));
    assert!(segments.body.contains("\tadd\tw0, w0, w0"));
    assert!(!segments.body.contains("@ tmp117"));
    assert!(!segments.pre.contains(".global\tscale"));
    assert!(segments.pre.contains("\t.arch armv8-a\n"));
}

#[test]
fn riscv_scan_falls_back_to_the_return_instruction_without_cfi() {
    let dump = concat!(
        "\t.text\n",
        "\t.globl\tscale\n",
        "\t.type\tscale, @function\n",
        "scale:\n",
        "\taddi\tsp,sp,-32\n",
        "\tlw\ta5,-20(s0)\n",
        "\taddi\tsp,sp,32\n",
        "\tjr\tra\n",
        "\t.size\tscale, .-scale\n",
        "\t.ident\t\"GCC\"\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::Riscv, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.warnings.is_empty());
    assert!(segments.body.ends_with("\tjr\tra\n"));
    assert!(segments.post.starts_with("\t.size\tscale, .-scale\n"));
}

#[test]
fn riscv_fallback_stays_off_when_the_dump_carries_cfi_markers() {
    let dump = concat!(
        "\t.text\n",
        "scale:\n",
        "\t.cfi_startproc\n",
        "\tret\n",
        "\tnop\n",
        "\t.cfi_endproc\n",
        "\t.size\tscale, .-scale\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::Riscv, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    // The return instruction does not close the region; the marker does.
    assert!(segments.body.contains("\tret\n\tnop\n"));
    assert!(segments.body.ends_with("\t.cfi_endproc\n"));
    assert!(segments.post.starts_with("\t.size\t"));
}

#[test]
fn missing_label_leaves_a_synthetic_body_and_a_warning() {
    let dump = "\t.text\n\t.globl\tother\nother:\n\tret\n";

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert_eq!(segments.body, ".globl scale\n.type scale, @function\n");
    assert_eq!(segments.post, "");
    assert_eq!(segments.warnings.len(), 1);
    assert!(segments.warnings[0].contains("opening marker 'scale:' not found"));
}

#[test]
fn unclosed_region_runs_to_the_end_of_the_dump_with_a_warning() {
    let dump = "\t.text\nscale:\n\tmovl\t%edi, %eax\n\tret\n";

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.body.ends_with("\tret\n"));
    assert_eq!(segments.post, "");
    assert_eq!(segments.warnings.len(), 1);
    assert!(segments.warnings[0].contains("no closing marker after 'scale:'"));
}

#[test]
fn clang_trailer_label_moves_to_post_and_the_epilogue_marker_stays_in_body() {
    let dump = concat!(
        "\t.text\n",
        "\t.file\t\"point.c\"\n",
        "\t.globl\tscale                           # -- Begin function scale\n",
        "\t.p2align\t4, 0x90\n",
        "\t.type\tscale,@function\n",
        "scale:                                  # @scale\n",
        "\t.cfi_startproc\n",
        "# %bb.0:\n",
        "\tpushq\t%rbp\n",
        "\tmovq\t%rsp, %rbp\n",
        "\tmovl\t%edi, -4(%rbp)\n",
        "\taddl\t%edi, %edi\n",
        "\tmovl\t%edi, %eax\n",
        "\tpopq\t%rbp\n",
        "\tretq\n",
        ".Lfunc_end0:\n",
        "\t.size\tscale, .Lfunc_end0-scale\n",
        "\t.cfi_endproc\n",
        "                                        # -- End function\n",
        "\t.ident\t\"clang version 14.0.6\"\n",
    );

    let profile = AsmProfile::for_target(&gas_target(Toolchain::Clang, Arch::X86, BitWidth::B64));
    let segments = extract_gas_function(dump, "scale", &profile);

    assert!(segments.warnings.is_empty());
    assert!(segments.body.ends_with("\tretq\n\t.cfi_endproc\n"));
    assert_eq!(segments.body.matches(".cfi_endproc").count(), 1);
    assert!(!segments.body.contains(".Lfunc_end0"));
    assert!(!segments.body.contains("%bb.0"));

    assert!(segments.post.starts_with(".Lfunc_end0:\n\t.size\tscale, .Lfunc_end0-scale\n"));
    assert!(segments.post.contains("\t.ident\t"));
}

#[test]
fn profiles_follow_toolchain_and_architecture() {
    let gcc_arm = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::Arm, BitWidth::B32));
    assert_eq!(gcc_arm.comment_marker, "@");
    assert!(gcc_arm.arm_directives);
    assert!(!gcc_arm.needs_epilogue_repair);

    let clang_arm = AsmProfile::for_target(&gas_target(Toolchain::Clang, Arch::Arm, BitWidth::B64));
    assert_eq!(clang_arm.comment_marker, "//");
    assert!(clang_arm.needs_epilogue_repair);

    let gcc_riscv = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::Riscv, BitWidth::B64));
    assert_eq!(gcc_riscv.comment_marker, "#");
    assert!(gcc_riscv.riscv_ret_fallback);

    let gcc_x86 = AsmProfile::for_target(&gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64));
    assert!(!gcc_x86.riscv_ret_fallback);
    assert!(!gcc_x86.arm_directives);
}

#[test]
fn strategy_routes_pic_and_ir_targets_away_from_the_scanner() {
    let pic = gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64).with_pic();
    assert_eq!(strategy_for(&pic), ExtractionStrategy::Verbatim);

    let ir = TargetDescriptor::new(
        Toolchain::Clang,
        Arch::X86,
        BitWidth::B64,
        Dialect::Llvm,
        OptLevel::O0,
        false,
    )
    .expect("valid target");
    assert_eq!(strategy_for(&ir), ExtractionStrategy::IrText);
    assert_eq!(strategy_for(&ir.with_pic()), ExtractionStrategy::Verbatim);

    let plain = gas_target(Toolchain::Gcc, Arch::X86, BitWidth::B64);
    assert!(matches!(strategy_for(&plain), ExtractionStrategy::NativeAsm(_)));
}
