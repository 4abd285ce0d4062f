/// WhatsApp click-to-chat link that opens an order conversation for a product.
pub fn order_link(number: &str, product_name: &str, product_url: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    let message = format!("Hi, I'm interested in {product_name}: {product_url}");
    format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(&message)
    )
}

/// Public storefront URL of a product detail page.
pub fn product_page_url(base_url: &str, product_id: &str) -> String {
    format!("{}/product/{}", base_url.trim_end_matches('/'), product_id)
}
