//! TCP Endpoint Unit Tests
//!
//! Tests for bind behavior, the accept-and-close loop, and lifecycle edges
//! of the scaffold's one network component.

#[cfg(test)]
mod tests {
    use crate::component::{Component, RuntimeContext};
    use crate::endpoint::TcpEndpoint;
    use crate::error::ConfigError;
    use crate::settings::Settings;
    use crate::shutdown::ShutdownSignal;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    fn ctx() -> RuntimeContext {
        RuntimeContext {
            settings: Arc::new(Settings::default()),
            shutdown: ShutdownSignal::new(),
        }
    }

    async fn wait_for_accepts(endpoint: &TcpEndpoint, expected: u64) {
        for _ in 0..100 {
            if endpoint.connections_accepted() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "endpoint accepted {} connections, expected {}",
            endpoint.connections_accepted(),
            expected
        );
    }

    /// Port 0 binds an ephemeral port, visible through `local_addr`.
    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let endpoint = TcpEndpoint::new("127.0.0.1:0".parse().unwrap());
        assert_eq!(endpoint.local_addr(), None);

        endpoint.start(&ctx()).await.unwrap();

        let local = endpoint.local_addr().unwrap();
        assert_eq!(endpoint.requested_addr().port(), 0);
        assert_ne!(local.port(), 0);

        endpoint.stop().await.unwrap();
    }

    /// Accepted connections are closed immediately and counted.
    #[tokio::test]
    async fn test_accepts_and_closes_connections() {
        let endpoint = TcpEndpoint::new("127.0.0.1:0".parse().unwrap());
        endpoint.start(&ctx()).await.unwrap();
        let addr = endpoint.local_addr().unwrap();

        for _ in 0..2 {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut buf = [0u8; 8];
            // The endpoint speaks no protocol: immediate EOF.
            let read = stream.read(&mut buf).await.unwrap();
            assert_eq!(read, 0);
        }

        wait_for_accepts(&endpoint, 2).await;
        endpoint.stop().await.unwrap();
    }

    /// Stop drains the accept loop and releases the port.
    #[tokio::test]
    async fn test_stop_releases_the_port() {
        let endpoint = TcpEndpoint::new("127.0.0.1:0".parse().unwrap());
        endpoint.start(&ctx()).await.unwrap();
        let addr = endpoint.local_addr().unwrap();

        endpoint.stop().await.unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_second_start_is_refused() {
        let endpoint = TcpEndpoint::new("127.0.0.1:0".parse().unwrap());
        endpoint.start(&ctx()).await.unwrap();

        let err = endpoint.start(&ctx()).await.unwrap_err();
        assert!(err.to_string().contains("already started"));

        endpoint.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_before_start_is_a_noop() {
        let endpoint = TcpEndpoint::new("127.0.0.1:0".parse().unwrap());

        endpoint.stop().await.unwrap();
    }

    /// An occupied port surfaces as a start error naming the address.
    #[tokio::test]
    async fn test_bind_conflict_fails_start() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = occupied.local_addr().unwrap();

        let endpoint = TcpEndpoint::new(addr);
        let err = endpoint.start(&ctx()).await.unwrap_err();

        assert!(err.to_string().contains("could not bind"));
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_from_settings_uses_configured_address() {
        let endpoint = TcpEndpoint::from_settings(&Settings::default()).unwrap();

        assert_eq!(
            endpoint.requested_addr(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[tokio::test]
    async fn test_from_settings_rejects_bad_host() {
        let mut settings = Settings::default();
        settings.server.host = "not an address".to_string();

        let err = TcpEndpoint::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidListenAddr { .. }));
    }
}
