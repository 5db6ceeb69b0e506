//! Inline scripts placed in the preview document.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Loads compiled code through a Blob URL.
///
/// The code travels base64-encoded, so backticks, quotes and literal
/// `</script>` sequences in the bundle cannot break out of the tag. The URL
/// is revoked as soon as the dynamic import settles.
pub fn bundle_loader(code: &str, namespace: &str) -> String {
    let encoded = STANDARD.encode(code.as_bytes());
    format!(
        r#"<script type="module" data-glimpse="loader">
(() => {{
  const bytes = Uint8Array.from(atob("{encoded}"), (c) => c.charCodeAt(0));
  const url = URL.createObjectURL(new Blob([bytes], {{ type: "text/javascript" }}));
  import(url)
    .catch((error) => {{
      console.error("[{namespace}] bundle failed to load", error);
      window.parent?.postMessage({{ type: "{namespace}-error", message: String(error?.message ?? error) }}, "*");
    }})
    .finally(() => URL.revokeObjectURL(url));
}})();
</script>"#
    )
}

/// Lets the host page forward key events to the focused element.
pub fn keyboard_forwarder(namespace: &str) -> String {
    format!(
        r#"<script data-glimpse="keyboard">
window.addEventListener("message", (event) => {{
  const msg = event.data;
  if (!msg || msg.type !== "{namespace}-keyboard") return;
  const target = document.activeElement || document.body;
  target.dispatchEvent(new KeyboardEvent(msg.eventType || "keydown", {{
    key: msg.key,
    code: msg.code,
    altKey: !!msg.altKey,
    ctrlKey: !!msg.ctrlKey,
    metaKey: !!msg.metaKey,
    shiftKey: !!msg.shiftKey,
    bubbles: true,
    cancelable: true,
  }}));
}});
</script>"#
    )
}

/// In-preview half of the hot-update protocol.
///
/// `css-update` replaces the text of a lazily created style element, so a
/// replayed update changes nothing. `full-reload` reloads the document.
pub fn hmr_listener(namespace: &str) -> String {
    format!(
        r#"<script data-glimpse="hmr">
window.addEventListener("message", (event) => {{
  const msg = event.data;
  if (!msg || msg.type !== "{namespace}-hmr") return;
  if (msg.action === "css-update") {{
    const css = (msg.payload && msg.payload.css) || "";
    let style = document.getElementById("{namespace}-hmr-style");
    if (!style) {{
      style = document.createElement("style");
      style.id = "{namespace}-hmr-style";
      document.head.appendChild(style);
    }}
    if (style.textContent !== css) style.textContent = css;
  }} else if (msg.action === "full-reload") {{
    window.location.reload();
  }}
}});
</script>"#
    )
}
