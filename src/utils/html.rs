/// Sanitizes post HTML with ammonia's whitelist: formatting tags produced by
/// the rich text editor survive, `<script>`, `<iframe>` and event-handler
/// attributes do not.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Escapes plain text for embedding in an HTML email body.
pub fn escape_text(input: &str) -> String {
    ammonia::clean_text(input)
}
