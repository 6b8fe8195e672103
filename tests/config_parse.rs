use recon_hub::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../recon-hub.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.pipeline.script, "auto_recon.sh");
    assert!(cfg.limits.channel_capacity >= 1);
    assert!(!cfg.server.bind.is_empty());
}

#[test]
fn partial_config_fills_defaults() {
    let cfg: Config = toml::from_str("[server]\nbind = \"127.0.0.1:9000\"\n").expect("parse TOML");
    assert_eq!(cfg.server.bind, "127.0.0.1:9000");
    assert_eq!(cfg.pipeline.interpreter, "bash");
    assert_eq!(cfg.paths.work_root, ".");
}
