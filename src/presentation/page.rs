// Server-side HTML rendering of the dashboard view
use crate::domain::map::MapView;
use crate::domain::view::{BarChart, DashboardView, DeviceDetail, Gallery, ImageCard, Notice, NoticeLevel};
use crate::application::dashboard_service::GALLERY_COLUMNS;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; color: #222; }
aside { width: 260px; padding: 1rem; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 1rem 2rem; }
.metrics { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.metric-card { background: linear-gradient(90deg, #667eea 0%, #764ba2 100%); padding: 1rem; border-radius: 10px; color: white; }
.metric-card .value { font-size: 1.8rem; }
.notice { padding: .6rem 1rem; border-radius: 6px; margin: .4rem 0; }
.notice.info { background: #e7f1fb; } .notice.success { background: #e6f4ea; }
.notice.warning { background: #fff4e5; } .notice.error { background: #fdecea; }
#map { height: 500px; width: 100%; max-width: 900px; }
.raspberry-card { border: 2px solid #ddd; border-radius: 10px; padding: 1rem; background: #f8f9fa; box-shadow: 2px 2px 5px rgba(0,0,0,0.1); }
.gallery { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.gallery img { width: 100%; }
.detection-badge { background: #28a745; color: white; padding: .25rem .5rem; border-radius: 15px; font-size: .8rem; }
.chart { display: flex; align-items: flex-end; gap: .5rem; height: 240px; border-bottom: 1px solid #999; }
.bar { width: 48px; }
.bar-labels { display: flex; gap: .5rem; } .bar-labels span { width: 48px; font-size: .75rem; transform: rotate(-45deg); }
"#;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_page(view: &DashboardView) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n");
    html.push_str("<title>🦟 Aedes aegypti monitor</title>\n");
    if view.refresh.auto_refresh {
        let _ = writeln!(
            html,
            "<meta http-equiv=\"refresh\" content=\"{}; url=/?refresh=auto\">",
            view.refresh.interval_secs
        );
    }
    html.push_str("<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\">\n");
    let _ = writeln!(html, "<style>{}</style>\n</head><body>", STYLE);

    render_sidebar(&mut html, view);

    html.push_str("<main>\n<h1>🦟 Aedes aegypti monitor 🦟</h1>\n");
    for notice in &view.notices {
        render_notice(&mut html, notice);
    }

    html.push_str("<section class=\"metrics\">\n");
    for tile in view.metrics.tiles() {
        let _ = writeln!(
            html,
            "<div class=\"metric-card\" id=\"metric-{}\"><div>{}</div><div class=\"value\">{}</div></div>",
            html_escape(&tile.id),
            html_escape(&tile.title),
            html_escape(&tile.value)
        );
    }
    html.push_str("</section>\n<hr>\n<h2>🗺️ Device locations</h2>\n");

    for alert in &view.alerts {
        render_notice(&mut html, &Notice::error(format!("🚨 {}", alert.message)));
    }

    if let Some(map) = &view.map {
        render_map(&mut html, map);
    }

    if view.has_selection {
        html.push_str("<hr>\n");
        if let Some(detail) = &view.detail {
            render_detail(&mut html, detail);
            render_gallery(&mut html, &view.gallery);
        }
        html.push_str(
            "<form method=\"post\" action=\"/selection/clear\"><button>🔄 Clear selection</button></form>\n",
        );
    }

    html.push_str("<hr>\n<h2>📊 Activity per device</h2>\n");
    if let Some(chart) = &view.chart {
        render_chart(&mut html, chart);
    }

    html.push_str("</main>\n</body></html>\n");
    html
}

fn render_notice(html: &mut String, notice: &Notice) {
    let class = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    let _ = writeln!(html, "<div class=\"notice {}\">{}</div>", class, html_escape(&notice.message));
}

fn render_sidebar(html: &mut String, view: &DashboardView) {
    let sidebar = &view.sidebar;
    let refresh = &view.refresh;

    html.push_str("<aside>\n<h3>🎛️ Control panel</h3>\n<form method=\"post\" action=\"/settings\">\n");
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"auto_refresh\"{}> 🔄 Auto-refresh</label><br>",
        if sidebar.auto_refresh { " checked" } else { "" }
    );

    html.push_str("<label>⏱️ Refresh interval <select name=\"interval\">");
    for secs in &sidebar.interval_options {
        let _ = write!(
            html,
            "<option value=\"{secs}\"{}>{secs} seconds</option>",
            if *secs == sidebar.interval_secs { " selected" } else { "" }
        );
    }
    html.push_str("</select></label><br>\n");

    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"show_images\"{}> 🖼️ Show images</label><br>",
        if sidebar.show_images { " checked" } else { "" }
    );

    html.push_str("<label>🗺️ Map style <select name=\"map_style\">");
    for style in &sidebar.map_styles {
        let name = html_escape(style.name());
        let _ = write!(
            html,
            "<option value=\"{name}\"{}>{name}</option>",
            if *style == sidebar.map_style { " selected" } else { "" }
        );
    }
    html.push_str("</select></label><br>\n<button>Apply</button>\n</form>\n");

    let cadence = if refresh.auto_refresh {
        Some(format!("⏰ Every {} seconds", refresh.interval_secs))
    } else {
        refresh
            .background_interval_secs
            .map(|secs| format!("⏰ Background refresh every {} seconds", secs))
    };
    match &cadence {
        Some(cadence) => {
            render_notice(html, &Notice::success(format!("🔄 Update #{}", refresh.tick)));
            render_notice(html, &Notice::info(cadence.as_str()));
            if refresh.cache_cleared {
                render_notice(html, &Notice::info("🧹 Cache cleared"));
            }
        }
        None => render_notice(html, &Notice::info("🔄 Auto-refresh disabled")),
    }

    html.push_str(
        "<hr>\n<div class=\"notice info\"><strong>ℹ️ Information:</strong><ul>\
         <li>Data refreshes automatically</li>\
         <li>Click a map marker to see device details</li>\
         <li>Alerts appear when there are detections</li></ul></div>\n",
    );

    if cadence.is_some() {
        let _ = writeln!(html, "<small>⏰ Last update: {}</small>", html_escape(&refresh.last_update));
    }
    html.push_str("</aside>\n");
}

fn render_map(html: &mut String, map: &MapView) {
    // `</` would end the script element early
    let markers = serde_json::to_string(&map.markers)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/");

    let _ = writeln!(
        html,
        r#"<div id="map"></div>
<form id="click-form" method="post" action="/map/click" hidden>
<input name="lat" id="click-lat"><input name="lng" id="click-lng"></form>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script>
const map = L.map('map').setView([{lat}, {lng}], {zoom});
L.tileLayer('{tiles}', {{ attribution: '{attribution}', subdomains: 'abcd' }}).addTo(map);
const esc = (s) => String(s).replace(/[&<>"']/g, (c) => ({{'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}})[c]);
for (const m of {markers}) {{
  const popup = `<div style="width:200px"><h4>${{esc(m.name)}}</h4>
    <p><strong>ID:</strong> ${{m.device_id}}</p>
    <p><strong>Location:</strong> ${{esc(m.location)}}</p>
    <p><strong>Detections:</strong> ${{m.total_detections}}</p>
    <p><strong>Last seen:</strong> ${{esc(m.last_seen)}}</p>
    <p><strong>Status:</strong> ${{esc(m.status)}}</p></div>`;
  L.circleMarker([m.lat, m.lng], {{ radius: 10, color: m.fill, fillOpacity: 0.8 }})
    .bindPopup(popup, {{ maxWidth: 250 }})
    .bindTooltip(m.tooltip)
    .on('click', () => {{
      document.getElementById('click-lat').value = m.lat;
      document.getElementById('click-lng').value = m.lng;
      document.getElementById('click-form').submit();
    }})
    .addTo(map);
}}
</script>"#,
        lat = map.center.0,
        lng = map.center.1,
        zoom = map.zoom,
        tiles = map.style.tile_url(),
        attribution = map.style.attribution(),
        markers = markers,
    );
}

fn render_detail(html: &mut String, detail: &DeviceDetail) {
    let _ = writeln!(
        html,
        "<h2>📱 {name}</h2>\n<div class=\"metrics\" style=\"grid-template-columns: 1fr 1fr\">\
         <div class=\"notice info\"><strong>ID:</strong> {id}<br><strong>Location:</strong> {location}<br>\
         <strong>Status:</strong> {status}</div>\
         <div class=\"notice info\"><strong>Total detections:</strong> {total}<br>\
         <strong>Last connection:</strong> {seen}<br><strong>Last detection:</strong> {detection}</div></div>",
        name = html_escape(&detail.name),
        id = detail.id,
        location = html_escape(&detail.location),
        status = html_escape(&detail.status),
        total = detail.total_detections,
        seen = html_escape(&detail.last_seen),
        detection = html_escape(&detail.last_detection),
    );
}

fn render_gallery(html: &mut String, gallery: &Gallery) {
    match gallery {
        Gallery::Hidden => {}
        Gallery::Empty => {
            html.push_str("<h3>📸 Recent images</h3>\n");
            render_notice(html, &Notice::info("📷 No images available for this device"));
        }
        Gallery::Images(cards) => {
            html.push_str("<h3>📸 Recent images</h3>\n<div class=\"gallery\">\n");
            for column in 0..GALLERY_COLUMNS {
                html.push_str("<div>\n");
                for card in cards.iter().filter(|c| c.column == column) {
                    render_card(html, card);
                }
                html.push_str("</div>\n");
            }
            html.push_str("</div>\n");
        }
    }
}

fn render_card(html: &mut String, card: &ImageCard) {
    let _ = writeln!(
        html,
        "<div class=\"raspberry-card\"><h5>📅 {ts}</h5>\
         <span class=\"detection-badge\">🎯 {count} detections</span>\
         <p><strong>Confidence:</strong> {confidence}</p>\
         <p><strong>Temp:</strong> {temp}°C | <strong>Humidity:</strong> {humidity}%</p></div>\
         <figure><img src=\"{src}\" alt=\"Image unavailable\" loading=\"lazy\">\
         <figcaption>{caption}</figcaption></figure>",
        ts = html_escape(&card.timestamp),
        count = card.detection_count,
        confidence = card.confidence,
        temp = card.temperature,
        humidity = card.humidity,
        src = html_escape(&card.src),
        caption = html_escape(&card.caption),
    );
}

fn render_chart(html: &mut String, chart: &BarChart) {
    let max = chart.max_value().max(1) as f64;

    let _ = writeln!(html, "<h4>{}</h4>\n<div class=\"chart\">", html_escape(&chart.title));
    for bar in &chart.bars {
        let height = (bar.value as f64 / max * 100.0).round();
        let _ = writeln!(
            html,
            "<div class=\"bar\" title=\"{label}: {value} ({status})\" style=\"height:{height}%;background:{color}\"></div>",
            label = html_escape(&bar.label),
            value = bar.value,
            status = bar.status.label(),
            height = height,
            color = bar.color,
        );
    }
    html.push_str("</div>\n<div class=\"bar-labels\">");
    for bar in &chart.bars {
        let _ = write!(html, "<span>{}</span>", html_escape(&bar.label));
    }
    html.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fleet::{DeviceRecord, DeviceStatus};
    use crate::domain::map::MapTileStyle;

    fn device(id: i64, lat: f64, lng: f64, detections: u64) -> DeviceRecord {
        DeviceRecord {
            id,
            name: format!("Pi {}", id),
            location: format!("Site {}", id),
            latitude: lat,
            longitude: lng,
            last_seen: None,
            status: DeviceStatus::Online,
            total_detections: detections,
            last_detection: None,
        }
    }

    #[test]
    fn test_marker_click_posts_marker_position() {
        let devices = vec![device(1, -9.93, -76.24, 0), device(2, -9.91, -76.2, 4)];
        let map = MapView::project(&devices, MapTileStyle::OpenStreetMap).unwrap();
        let mut html = String::new();
        render_map(&mut html, &map);

        assert!(html.contains("getElementById('click-lat').value = m.lat;"));
        assert!(html.contains("getElementById('click-lng').value = m.lng;"));
        assert!(!html.contains("latlng"));
        assert!(html.contains(r#""lat":-9.93,"lng":-76.24"#));
        assert!(html.contains(r##""fill":"#222222""##));
        assert!(html.contains("color: m.fill"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"quoted\" 'single'"), "&quot;quoted&quot; &#39;single&#39;");
    }
}
