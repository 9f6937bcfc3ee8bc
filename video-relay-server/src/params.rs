use std::path::PathBuf;
use clap::Parser;
use url::Url;

pub const DEFAULT_BASE_DIR: &str = "/opt/video-downloader/videos";

#[derive(Parser, Debug)]
#[clap(about = "Stores uploaded videos by schema and worker id and serves them back")]
pub struct Args {
    #[clap(long, default_value = "0.0.0.0")]
    pub(crate) host: String,
    #[clap(long, env = "PORT", default_value_t = 3000)]
    pub(crate) port: u16,
    #[clap(long, env = "VIDEO_BASE_DIR", default_value = DEFAULT_BASE_DIR)]
    pub(crate) base_dir: PathBuf,
    /// Prefix for download URLs; defaults to http://localhost:{port}
    #[clap(long, env = "PUBLIC_BASE_URL")]
    pub(crate) public_base_url: Option<String>,
}

/// Settings shared by every request, built once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub base_dir: PathBuf,
    video_endpoint: Url,
}

impl RelayConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        base_dir: impl Into<PathBuf>,
        public_base_url: Option<&str>,
    ) -> Result<Self, url::ParseError> {
        let public_base_url = public_base_url
            .map(str::to_string)
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let video_endpoint = Url::parse(&format!("{}/video", public_base_url.trim_end_matches('/')))?;
        Ok(Self {
            host: host.into(),
            port,
            base_dir: base_dir.into(),
            video_endpoint,
        })
    }

    /// `{public_base_url}/video?schema=..&worker_id=..`
    pub fn download_url(&self, schema: &str, worker_id: &str) -> Url {
        let mut url = self.video_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("schema", schema)
            .append_pair("worker_id", worker_id);
        url
    }
}

impl TryFrom<Args> for RelayConfig {
    type Error = url::ParseError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        Self::new(args.host, args.port, args.base_dir, args.public_base_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_from_flags() {
        let args = Args::parse_from([
            "video-relay-server",
            "--port", "8081",
            "--base-dir", "/data/videos",
            "--public-base-url", "http://relay.local:8081",
        ]);
        assert_eq!(args.port, 8081);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.base_dir, PathBuf::from("/data/videos"));

        let config = RelayConfig::try_from(args).unwrap();
        assert_eq!(
            config.download_url("channeltest", "1").as_str(),
            "http://relay.local:8081/video?schema=channeltest&worker_id=1"
        );
    }

    #[test]
    fn test_public_base_url_default_follows_port() {
        let config = RelayConfig::new("127.0.0.1", 8080, "/tmp/videos", None).unwrap();
        assert!(config.download_url("a", "b").as_str().starts_with("http://localhost:8080/video?"));
    }

    #[test]
    fn test_public_base_url_keeps_path_prefix() {
        let config = RelayConfig::new("0.0.0.0", 3000, "/v", Some("https://cdn.example.com/relay/")).unwrap();
        assert_eq!(
            config.download_url("s", "1").as_str(),
            "https://cdn.example.com/relay/video?schema=s&worker_id=1"
        );
    }

    #[test]
    fn test_download_url_encodes_identifiers() {
        let config = RelayConfig::new("0.0.0.0", 3000, "/v", Some("http://relay")).unwrap();
        let url = config.download_url("a&b", "x=y");
        assert_eq!(url.query(), Some("schema=a%26b&worker_id=x%3Dy"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![
            ("schema".to_string(), "a&b".to_string()),
            ("worker_id".to_string(), "x=y".to_string()),
        ]);
    }

    #[test]
    fn test_rejects_invalid_public_base_url() {
        assert!(RelayConfig::new("0.0.0.0", 3000, "/v", Some("not a url")).is_err());
    }
}
