use macroquad::prelude::*;
use macroquad_tileview::Map;

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic View".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let map = Map::load("assets/map.json")
        .await
        .expect("Failed to load map");

    loop {
        clear_background(BLACK);

        // Pan the viewport on a diagonal; the fractional part of the offset
        // exercises the sub-tile scroll.
        let t = get_time() as f32;
        let scroll = vec2(t.sin().abs() * 200.0, t.cos().abs() * 120.0);
        map.draw(Rect::new(
            scroll.x,
            scroll.y,
            screen_width(),
            screen_height(),
        ));

        draw_text(
            &format!("FPS: {}", get_fps()),
            screen_width() - 135.0,
            55.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
