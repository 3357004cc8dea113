#![no_main]

use std::time::{Duration, Instant};

use encore::geometry::{PageSize, PixelSize};
use encore::view::{PageGeometry, ScrollDirection, ViewOptions, ViewState};
use libfuzzer_sys::fuzz_target;

// Input layout: [page_count, viewport_w, viewport_h, (size pair)*, action*]
fuzz_target!(|data: &[u8]| {
    let [count, vw, vh, rest @ ..] = data else {
        return;
    };
    let count = usize::from(*count % 12) + 1;
    if rest.len() < count * 2 {
        return;
    }
    let (sizes, actions) = rest.split_at(count * 2);
    let pages: Vec<PageSize> = sizes
        .chunks_exact(2)
        .map(|c| PageSize::new(f64::from(c[0]) * 4.0 + 1.0, f64::from(c[1]) * 4.0 + 1.0))
        .collect();
    let viewport = PixelSize::new(u32::from(*vw) * 8 + 1, u32::from(*vh) * 8 + 1);

    let mut view = ViewState::new(pages.page_count(), &ViewOptions::default());
    view.set_viewport(&pages, viewport);
    let mut now = Instant::now();

    for &a in actions {
        now += Duration::from_millis(u64::from(a >> 4) * 100);
        match a & 0x0f {
            0 => view.smart_advance(&pages, now),
            1 => view.next_page(&pages, now),
            2 => view.prev_page(&pages, now),
            3 => view.zoom_in(&pages, now),
            4 => view.zoom_out(&pages, now),
            5 => view.zoom_reset(&pages, now),
            6 => view.set_spread_mode(&pages, true, now),
            7 => view.set_spread_mode(&pages, false, now),
            8 => view.scroll(ScrollDirection::Down),
            9 => view.scroll(ScrollDirection::Right),
            10 => view.scroll(ScrollDirection::Up),
            11 => {
                let _ = view.goto_page_number(&pages, u32::from(a >> 4), now);
            }
            12 => view.toggle_fullscreen(),
            13 => view.set_viewport(&pages, PixelSize::new(viewport.height, viewport.width)),
            _ => {
                view.fire_overlays(now);
            }
        }

        let nav = view.navigator();
        assert!(nav.current_left() < pages.len());
        if nav.is_spread() {
            assert_eq!(nav.current_left() % 2, 0, "spread must start on an even index");
        }

        for axis in [view.horizontal(), view.vertical()] {
            assert!(axis.value >= axis.lower && axis.value <= axis.max_value(), "{axis:?}");
        }

        if let (Some(fit), Some(placement)) = (view.fit(), view.placement()) {
            let current = view.viewport();
            assert!(fit.content.width >= current.width && fit.content.height >= current.height);
            assert_eq!(placement.left.index, nav.current_left());
            assert_eq!(placement.right.map(|r| r.index), nav.right_page());
        }
    }
});
