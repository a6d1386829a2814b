use ammonia;

/// Sanitizes HTML in operator-supplied text (scenario and checklist
/// descriptions) before it is stored.
///
/// Whitelist-based: safe tags like <b> and <p> survive, <script>, <iframe>
/// and event-handler attributes are stripped. Admin accounts write these
/// fields, but every user's browser renders them.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
