use crate::LedgerError;
use std::collections::HashSet;
use tracing::info;
use url::Url;

/// Known peers, stored as normalized `host:port` strings.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: HashSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer given as a URL (`http://host:5000/...`) or a bare `host:port`.
    /// Registering the same peer twice is a no-op.
    pub fn register(&mut self, address: &str) -> Result<(), LedgerError> {
        let node = normalize_address(address)?;
        if self.nodes.insert(node.clone()) {
            info!(%node, "registered peer");
        }
        Ok(())
    }

    /// Register every address, or none of them if any is malformed.
    pub fn register_all<I, S>(&mut self, addresses: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = addresses
            .into_iter()
            .map(|a| normalize_address(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        for node in normalized {
            if self.nodes.insert(node.clone()) {
                info!(%node, "registered peer");
            }
        }
        Ok(())
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Peers in lexicographic order.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<_> = self.nodes.iter().cloned().collect();
        nodes.sort();
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Reduce an address to the `host:port` (or bare host) a peer is reached at.
///
/// Anything carrying a scheme or a `//` authority prefix goes through [`Url`];
/// bare `host:port` is matched by hand since it does not parse as a URL.
pub fn normalize_address(address: &str) -> Result<String, LedgerError> {
    let invalid = || LedgerError::InvalidAddress(address.to_string());
    let trimmed = address.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let url = if trimmed.contains("://") {
        Some(Url::parse(trimmed))
    } else {
        trimmed
            .starts_with("//")
            .then(|| Url::parse(&format!("http:{trimmed}")))
    };

    match url {
        Some(parsed) => {
            let url = parsed.map_err(|_| invalid())?;
            let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
            Ok(match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        }
        None => {
            let end = trimmed.find('/').unwrap_or(trimmed.len());
            let host_port = &trimmed[..end];
            match host_port.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(host_port.to_string())
                }
                _ => Err(invalid()),
            }
        }
    }
}
