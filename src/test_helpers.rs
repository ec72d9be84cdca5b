//! Shared test utilities for the artgrab test suite.
//!
//! Provides synthetic image builders (letterboxed, all-black, noisy), PNG
//! encoding for feeding decoders, and a tiny loopback HTTP server for
//! exercising [`HttpFetcher`](crate::fetch::HttpFetcher) without the network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let img = letterboxed(100, 50, Bands { top: 10, ..Bands::default() });
//! let server = serve(vec![Route::ok("/a.png", png_bytes(&img))]);
//! let url = server.url("/a.png");
//! ```

use image::{ImageEncoder, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

// =========================================================================
// Synthetic images
// =========================================================================

/// Widths of the black border bands to paint on a synthetic image.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bands {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// Deterministic pseudo-random content whose colour channels never all fall
/// at or below 60, so no content pixel reads as blank at the default
/// threshold.
pub fn noise(width: u32, height: u32) -> RgbaImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        Rgba([a, b, 61 + c % 195, 255])
    })
}

/// Noise content with solid black bands painted over the requested edges.
pub fn letterboxed(width: u32, height: u32, bands: Bands) -> RgbaImage {
    let mut img = noise(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        if y < bands.top
            || y >= height.saturating_sub(bands.bottom)
            || x < bands.left
            || x >= width.saturating_sub(bands.right)
        {
            *px = Rgba([0, 0, 0, 255]);
        }
    }
    img
}

/// A uniformly coloured image.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Encode as PNG (lossless, so decoded pixels match exactly).
pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    out
}

// =========================================================================
// Loopback HTTP server
// =========================================================================

/// One canned route served by [`serve`].
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Route {
    pub fn ok(path: &str, body: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(path: &str, body: Vec<u8>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok(path, body)
        }
    }
}

/// Handle to a running loopback server. The accept thread is detached and
/// lives until the test process exits.
pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start an HTTP/1.1 server on `127.0.0.1` serving `routes`; unknown paths
/// get a 404.
pub fn serve(routes: Vec<Route>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Arc<HashMap<String, Route>> =
        Arc::new(routes.into_iter().map(|r| (r.path.clone(), r)).collect());

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let routes = Arc::clone(&routes);
            std::thread::spawn(move || {
                let _ = handle_connection(stream, &routes);
            });
        }
    });

    TestServer {
        base_url: format!("http://{addr}"),
    }
}

fn handle_connection(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body, delay) = match routes.get(path) {
        Some(route) => (route.status, route.body.as_slice(), route.delay),
        None => (404, b"not found".as_slice(), Duration::ZERO),
    };
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
    write!(
        stream,
        "HTTP/1.1 {status} STATUS\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}
