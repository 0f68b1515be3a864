/// URL path segment after which delivery transformations are inserted.
const UPLOAD_SEGMENT: &str = "/upload/";

/// Web and thumbnail delivery URLs for a stored image.
///
/// The transformation is spliced in after `/upload/`. URLs without that
/// segment are returned unchanged for both variants.
pub fn derive_variants(
    secure_url: &str,
    web_transformation: &str,
    thumb_transformation: &str,
) -> (String, String) {
    if !secure_url.contains(UPLOAD_SEGMENT) {
        return (secure_url.to_string(), secure_url.to_string());
    }
    (
        insert_transformation(secure_url, web_transformation),
        insert_transformation(secure_url, thumb_transformation),
    )
}

fn insert_transformation(url: &str, transformation: &str) -> String {
    url.replace(
        UPLOAD_SEGMENT,
        &format!("{}{}/", UPLOAD_SEGMENT, transformation.trim_matches('/')),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB: &str = "f_auto,q_auto";
    const THUMB: &str = "c_fill,g_face,w_480,h_320";

    #[test]
    fn test_variants_inserted_after_upload_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712/vitrine/uploads/hero.jpg";
        let (web, thumb) = derive_variants(url, WEB, THUMB);
        assert_eq!(
            web,
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto/v1712/vitrine/uploads/hero.jpg"
        );
        assert_eq!(
            thumb,
            "https://res.cloudinary.com/demo/image/upload/c_fill,g_face,w_480,h_320/v1712/vitrine/uploads/hero.jpg"
        );
    }

    #[test]
    fn test_no_upload_segment_keeps_url() {
        let url = "http://localhost:8000/media/vitrine/uploads/hero.jpg";
        let (web, thumb) = derive_variants(url, WEB, THUMB);
        assert_eq!(web, url);
        assert_eq!(thumb, url);
    }
}
