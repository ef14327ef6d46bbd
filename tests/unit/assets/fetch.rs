use std::io::Cursor;

use base64::Engine as _;

use super::*;

struct StaticFetcher(Vec<u8>);

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &url::Url, max_bytes: usize) -> MemeResult<Vec<u8>> {
        if self.0.len() > max_bytes {
            return Err(MemeError::image_acquisition("too big"));
        }
        Ok(self.0.clone())
    }
}

struct Unreachable;

#[async_trait]
impl ImageFetcher for Unreachable {
    async fn fetch(&self, url: &url::Url, _max_bytes: usize) -> MemeResult<Vec<u8>> {
        Err(MemeError::image_acquisition(format!("connect {url}: refused")))
    }
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[tokio::test]
async fn bytes_source_decodes_without_fetching() {
    let src = ImageSource::bytes(png_bytes(4, 3));
    let img = acquire_image(&src, &Unreachable, usize::MAX).await.unwrap();
    assert_eq!((img.canvas.width, img.canvas.height), (4, 3));
}

#[tokio::test]
async fn http_source_goes_through_fetcher() {
    let src = ImageSource::url("https://memes.invalid/doge.png").unwrap();
    let img = acquire_image(&src, &StaticFetcher(png_bytes(2, 5)), usize::MAX)
        .await
        .unwrap();
    assert_eq!((img.canvas.width, img.canvas.height), (2, 5));

    let err = acquire_image(&src, &Unreachable, usize::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, MemeError::ImageAcquisition(_)));
}

#[tokio::test]
async fn data_url_source_decodes_inline_payload() {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(1, 1));
    let src = ImageSource::url(&format!("data:image/png;base64,{b64}")).unwrap();
    let img = acquire_image(&src, &Unreachable, usize::MAX).await.unwrap();
    assert_eq!(img.rgba8, vec![10, 20, 30, 255]);
}

#[tokio::test]
async fn file_url_source_reads_from_disk() {
    let tmp = std::env::temp_dir().join(format!(
        "memeforge_fetch_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("base.png");
    std::fs::write(&path, png_bytes(3, 3)).unwrap();

    let src = ImageSource::Url(url::Url::from_file_path(&path).unwrap());
    let img = acquire_image(&src, &Unreachable, usize::MAX).await.unwrap();
    assert_eq!(img.canvas.width, 3);

    let missing = ImageSource::Url(url::Url::from_file_path(tmp.join("nope.png")).unwrap());
    assert!(matches!(
        acquire_image(&missing, &Unreachable, usize::MAX).await,
        Err(MemeError::ImageAcquisition(_))
    ));

    std::fs::remove_dir_all(&tmp).ok();
}

#[tokio::test]
async fn unsupported_scheme_is_acquisition_error() {
    let src = ImageSource::url("ftp://example.com/a.png").unwrap();
    assert!(matches!(
        acquire_image(&src, &Unreachable, usize::MAX).await,
        Err(MemeError::ImageAcquisition(_))
    ));
}

#[tokio::test]
async fn payload_over_limit_is_rejected_before_decode() {
    let bytes = png_bytes(4, 4);
    let limit = bytes.len() - 1;
    let src = ImageSource::bytes(bytes);
    let err = acquire_image(&src, &Unreachable, limit).await.unwrap_err();
    assert!(err.to_string().contains("exceeds limit"));
}

#[tokio::test]
async fn non_image_payload_is_acquisition_error() {
    let src = ImageSource::url("https://memes.invalid/page.html").unwrap();
    let fetcher = StaticFetcher(b"<html>not an image</html>".to_vec());
    assert!(matches!(
        acquire_image(&src, &fetcher, usize::MAX).await,
        Err(MemeError::ImageAcquisition(_))
    ));
}
