use clap::Parser;
use incubator::cli::{Args, Commands};
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("incubator")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_new_args() {
    let parsed =
        Args::try_parse_from(make_args(&["new", "--template", "empty", "-y", "-o", "/tmp/p"]))
            .unwrap();

    match parsed.command {
        Commands::New(args) => {
            assert_eq!(args.template.template.as_deref(), Some("empty"));
            assert!(args.template.yes);
            assert!(!args.template.stdin);
            assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/p")));
            assert!(!args.dry_run);
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert!(!parsed.verbose);
}

#[test]
fn test_init_defaults_to_current_dir() {
    let parsed = Args::try_parse_from(make_args(&["init", "--stdin"])).unwrap();
    match parsed.command {
        Commands::Init(args) => {
            assert_eq!(args.dir, PathBuf::from("."));
            assert!(args.template.stdin);
            assert!(!args.template.skip_hooks);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_verbose_is_global() {
    let parsed = Args::try_parse_from(make_args(&["list", "--verbose"])).unwrap();
    assert!(parsed.verbose);
    assert!(matches!(parsed.command, Commands::List));
}

#[test]
fn test_create_template_requires_name() {
    assert!(Args::try_parse_from(make_args(&["create-template"])).is_err());
    let parsed = Args::try_parse_from(make_args(&["create-template", "my-stack"])).unwrap();
    assert!(matches!(parsed.command, Commands::CreateTemplate { name } if name == "my-stack"));
}

#[test]
fn test_missing_subcommand_fails() {
    assert!(Args::try_parse_from(make_args(&[])).is_err());
}

#[test]
fn test_config_edit_flag() {
    let parsed = Args::try_parse_from(make_args(&["config"])).unwrap();
    assert!(matches!(parsed.command, Commands::Config { edit: false }));

    let parsed = Args::try_parse_from(make_args(&["config", "--edit"])).unwrap();
    assert!(matches!(parsed.command, Commands::Config { edit: true }));
}
