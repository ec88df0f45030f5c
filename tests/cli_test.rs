use clap::Parser;
use owl::cli::{parse_context_pair, Args};
use owl::config::ConfigFormat;
use serde_json::json;
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("owl")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_basic_args() {
    let args = make_args(&["app", "base"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.name, "app");
    assert_eq!(parsed.template, "base");
    assert!(parsed.templates_dirs.is_empty());
    assert_eq!(parsed.config_format, ConfigFormat::Toml);
    assert_eq!(parsed.config_name, "owl_config");
    assert!(!parsed.verbose);
    assert!(!parsed.git_cli);
}

#[test]
fn test_templates_dirs_keep_order() {
    let args = make_args(&["-t", "./first", "--templates-dir", "./second", "app", "base"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.templates_dirs, vec![PathBuf::from("./first"), PathBuf::from("./second")]);
}

#[test]
fn test_all_flags() {
    let args = make_args(&[
        "--verbose",
        "--git-cli",
        "--config-format",
        "yaml",
        "--cache-dir",
        "/var/cache/owl",
        "-c",
        "port=8080",
        "app",
        "github.com/acme/tmpl",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.verbose);
    assert!(parsed.git_cli);
    assert_eq!(parsed.config_format, ConfigFormat::Yaml);
    assert_eq!(parsed.cache_dir, Some(PathBuf::from("/var/cache/owl")));
    assert_eq!(parsed.context, vec![("port".to_string(), json!(8080))]);
}

#[test]
fn test_template_config_context() {
    let args = make_args(&["-c", "author=ana", "-c", "name=override", "app", "base"]);
    let parsed = Args::try_parse_from(args).unwrap();
    let template_config = parsed.template_config();

    assert_eq!(template_config.file_name(), "owl_config.toml");
    assert_eq!(template_config.context, json!({"name": "override", "author": "ana"}));
}

#[test]
fn test_project_config_uses_current_dir() {
    let args = make_args(&["-t", "./templates", "app", "base"]);
    let parsed = Args::try_parse_from(args).unwrap();
    let project_config = parsed.project_config().unwrap();

    assert_eq!(project_config.base_dir, std::env::current_dir().unwrap());
    assert_eq!(project_config.project_root(), std::env::current_dir().unwrap().join("app"));
    assert_eq!(project_config.templates_dirs, vec![PathBuf::from("./templates")]);
}

#[test]
fn test_parse_context_pair() {
    assert_eq!(parse_context_pair("debug=true").unwrap(), ("debug".to_string(), json!(true)));
    assert_eq!(
        parse_context_pair("title=hello world").unwrap(),
        ("title".to_string(), json!("hello world"))
    );
    assert_eq!(parse_context_pair("url=a=b").unwrap(), ("url".to_string(), json!("a=b")));
    assert!(parse_context_pair("novalue").is_err());
    assert!(parse_context_pair("=value").is_err());
}

#[test]
fn test_missing_args() {
    let args = make_args(&["app"]);
    assert!(Args::try_parse_from(args).is_err());
}

#[test]
fn test_too_many_args() {
    let args = make_args(&["app", "base", "extra"]);
    assert!(Args::try_parse_from(args).is_err());
}
