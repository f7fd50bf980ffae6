use image::{Rgba, RgbaImage};

use photobooth::render::encoding::{decode_image, encode_png, from_data_url};
use photobooth::render::glyph::{sticker_anchor_color, STICKERS};
use photobooth::render::{display_to_image, DisplayRect};
use photobooth::state::overlay::OverlayIdGenerator;
use photobooth::{
    Compositor, EditSession, FilterParameters, Library, Overlay, OverlayList, PhotoService, Point,
};

fn base_png(width: u32, height: u32) -> Vec<u8> {
    let base = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 251) as u8, 255])
    });
    encode_png(&base).unwrap()
}

#[test]
fn later_overlay_occludes_earlier_one() {
    let base = base_png(64, 64);
    let compositor = Compositor::default();
    let filters = FilterParameters::default();

    let a_then_b = OverlayList::try_from(vec![
        Overlay::sticker("a", Point::new(10.0, 10.0), "🎈"),
        Overlay::sticker("b", Point::new(10.0, 10.0), "🔥"),
    ])
    .unwrap();
    let png = compositor.compose(&base, &filters, &a_then_b).unwrap();
    let pixel = *decode_image(&png).unwrap().to_rgba8().get_pixel(10, 10);
    assert_eq!(Some(pixel), sticker_anchor_color("🔥"));
    assert_ne!(Some(pixel), sticker_anchor_color("🎈"));

    let b_then_a = OverlayList::try_from(vec![
        Overlay::sticker("b", Point::new(10.0, 10.0), "🔥"),
        Overlay::sticker("a", Point::new(10.0, 10.0), "🎈"),
    ])
    .unwrap();
    let swapped = compositor.compose(&base, &filters, &b_then_a).unwrap();
    assert_ne!(png, swapped);
}

#[test]
fn composing_twice_gives_identical_bytes() {
    let base = base_png(120, 90);
    let filters = FilterParameters::try_new(140.0, 70.0, true, true).unwrap();
    let mut overlays = OverlayList::new();
    for (i, glyph) in STICKERS.iter().enumerate() {
        let at = Point::new(15.0 * i as f32, 40.0);
        overlays
            .push(Overlay::sticker(format!("s{}", i), at, *glyph))
            .unwrap();
    }
    overlays
        .push(Overlay::text("caption", Point::new(60.0, 80.0), "Happy Holidays!"))
        .unwrap();

    let compositor = Compositor::default();
    let first = compositor.compose(&base, &filters, &overlays).unwrap();
    let second = compositor.compose(&base, &filters, &overlays).unwrap();
    assert_eq!(first, second);
}

#[test]
fn identity_filters_keep_base_pixels() {
    let base = base_png(33, 17);
    let png = Compositor::default()
        .compose(&base, &FilterParameters::default(), &OverlayList::new())
        .unwrap();
    assert_eq!(
        decode_image(&png).unwrap().to_rgba8(),
        decode_image(&base).unwrap().to_rgba8()
    );
}

#[test]
fn center_click_maps_to_canvas_center() {
    for (width, height) in [(640.0, 480.0), (213.0, 160.0), (1280.0, 960.0)] {
        let rect = DisplayRect::new(40.0, 25.0, width, height);
        let point =
            display_to_image(40.0 + width / 2.0, 25.0 + height / 2.0, rect, 640, 480).unwrap();
        assert_eq!(point, Point::new(320.0, 240.0));
    }
}

#[test]
fn placed_sticker_lands_where_clicked_in_final_image() {
    let mut session = EditSession::new(&base_png(640, 480), Compositor::default())
        .unwrap()
        .with_id_generator(OverlayIdGenerator::starting_at(0));

    // Preview shown at half size, offset on the page
    let rect = DisplayRect::new(100.0, 50.0, 320.0, 240.0);
    session.toggle_sticker("⭐");
    let placed = session
        .place_selected(100.0 + 160.0, 50.0 + 60.0, rect)
        .unwrap()
        .unwrap();
    assert_eq!(placed.position, Point::new(320.0, 120.0));

    let image = decode_image(&session.render().unwrap()).unwrap().to_rgba8();
    assert_eq!(
        Some(*image.get_pixel(320, 120)),
        sticker_anchor_color("⭐")
    );
}

#[test]
fn saved_photo_resolves_to_rendered_image() {
    let mut session = EditSession::new(&base_png(200, 150), Compositor::default()).unwrap();
    session.set_brightness(120.0).unwrap();
    session.toggle_grayscale();
    session.add_sticker("❤️", Point::new(50.0, 50.0)).unwrap();
    session.add_text("Hi", Point::new(100.0, 120.0)).unwrap();
    let rendered = session.render().unwrap();

    let service = PhotoService::new(Library::open_in_memory().unwrap());
    let record = service.create(session.finish("u1").unwrap()).unwrap();

    let public = service.resolve(&record.share_token).unwrap();
    assert_eq!(public.filters.brightness, 120.0);
    assert!(public.filters.grayscale);
    assert_eq!(public.overlays.len(), 2);

    let (_, png) = from_data_url(&public.image_ref).unwrap();
    assert_eq!(png, rendered);
}

#[test]
fn share_link_qr_decodes_to_url() {
    let service = PhotoService::new(Library::open_in_memory().unwrap());
    let record = service
        .create(photobooth::CreatePhoto::new("u1", "http://x/img.png").with_token("tok-qr"))
        .unwrap();

    let link = service.share_link(&record.share_token).unwrap();
    assert_eq!(link.url, "http://localhost:3000/share/tok-qr");

    let image = decode_image(&link.qr_png).unwrap().to_luma8();
    assert!(image.width() >= 300);
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    let (_, content) = grids[0].decode().unwrap();
    assert_eq!(content, link.url);
}
