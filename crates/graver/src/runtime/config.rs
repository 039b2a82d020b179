use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub config_path: Option<PathBuf>,
    pub speed: f64,
    pub power: f64,
    pub sweep: bool,
    pub json_logs: bool,
    pub metrics_addr: Option<String>,
    pub interruptible_cooldown: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            config_path: None,
            speed: 0.5,
            power: 0.5,
            sweep: false,
            json_logs: false,
            metrics_addr: None,
            interruptible_cooldown: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--config" => {
                    if i + 1 < args.len() {
                        cfg.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--speed" => {
                    if i + 1 < args.len() {
                        cfg.speed = args[i + 1].parse().unwrap_or(cfg.speed);
                        i += 1;
                    }
                }
                "--power" => {
                    if i + 1 < args.len() {
                        cfg.power = args[i + 1].parse().unwrap_or(cfg.power);
                        i += 1;
                    }
                }
                "--sweep" => {
                    cfg.sweep = true;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--interruptible-cooldown" => {
                    cfg.interruptible_cooldown = true;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"graver - solenoid graver stroke controller (host simulation)

USAGE:
    graver [OPTIONS]

OPTIONS:
    --config <PATH>          JSON file overriding controller constants
    --speed <0..1>           Constant speed setpoint [default: 0.5]
    --power <0..1>           Constant power setpoint [default: 0.5]
    --sweep                  Sweep speed up and down instead of holding it
    --run-seconds <SECS>     Run for a fixed duration then exit
    --json-logs              Output logs in JSON format
    --metrics-addr <ADDR>    Serve Prometheus metrics on address (e.g., 0.0.0.0:9090)
    --interruptible-cooldown Let shutdown cut a cooldown pause short
    -h, --help               Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                 Set log filter (e.g., RUST_LOG=debug,graver_core=trace)

EXAMPLES:
    # Ten second run at full speed, quarter power
    graver --run-seconds 10 --speed 1.0 --power 0.25

    # Sweep with metrics
    graver --sweep --metrics-addr 127.0.0.1:9090
"#
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("graver")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[]));
        assert_eq!(cfg.speed, 0.5);
        assert!(cfg.run_seconds.is_none());
        assert!(!cfg.sweep);
    }

    #[test]
    fn parses_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[
            "--speed",
            "1.0",
            "--power",
            "0.25",
            "--run-seconds",
            "3",
            "--sweep",
            "--json-logs",
            "--interruptible-cooldown",
            "--config",
            "graver.json",
        ]));
        assert_eq!(cfg.speed, 1.0);
        assert_eq!(cfg.power, 0.25);
        assert_eq!(cfg.run_seconds, Some(3));
        assert!(cfg.sweep && cfg.json_logs && cfg.interruptible_cooldown);
        assert_eq!(cfg.config_path, Some(PathBuf::from("graver.json")));
    }

    #[test]
    fn bad_number_keeps_default() {
        let cfg = RuntimeConfig::from_args(&args(&["--speed", "fast"]));
        assert_eq!(cfg.speed, 0.5);
    }

    #[test]
    fn help_stops_parsing() {
        let cfg = RuntimeConfig::from_args(&args(&["-h", "--sweep"]));
        assert!(cfg.show_help);
        assert!(!cfg.sweep);
    }
}
