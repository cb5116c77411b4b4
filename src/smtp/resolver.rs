//! Hostname lookup used to vet the HELO hostname

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// Forward lookup of a hostname
pub trait Resolver: Send + Sync {
    /// Resolve `host` to zero or more addresses
    fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the platform's name service
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok((host, 0)
            .to_socket_addrs()?
            .map(|addr| addr.ip())
            .collect())
    }
}

impl<F> Resolver for F
where
    F: Fn(&str) -> io::Result<Vec<IpAddr>> + Send + Sync,
{
    fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self(host)
    }
}
