use binbuf_common::Result;

use super::Buffer;
use crate::packed::PackedView;
use crate::resource::Resource;
use crate::shapes::{Colour, Complex, Int24, Point, Point16, PointF, Rectangle, Rectangle16};

impl<R: Resource> Buffer<R> {
    pub fn write_int24(&mut self, value: Int24) -> Result<()> {
        let mut view = PackedView::default();
        for (i, b) in value.to_bytes().into_iter().enumerate() {
            view.set_byte(i, b);
        }
        self.write_view(&view, 3)
    }

    pub fn read_int24(&mut self) -> Result<Int24> {
        let view = self.read_view(3)?;
        Ok(Int24::from_bytes([view.byte(0), view.byte(1), view.byte(2)]))
    }

    pub fn write_point(&mut self, p: Point) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<i32>(0, p.x);
        view.set_lane::<i32>(1, p.y);
        self.write_view(&view, 8)
    }

    pub fn read_point(&mut self) -> Result<Point> {
        let view = self.read_view(8)?;
        Ok(Point::new(view.lane(0), view.lane(1)))
    }

    pub fn write_point_f(&mut self, p: PointF) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<f32>(0, p.x);
        view.set_lane::<f32>(1, p.y);
        self.write_view(&view, 8)
    }

    pub fn read_point_f(&mut self) -> Result<PointF> {
        let view = self.read_view(8)?;
        Ok(PointF::new(view.lane(0), view.lane(1)))
    }

    pub fn write_point16(&mut self, p: Point16) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<u16>(0, p.x);
        view.set_lane::<u16>(1, p.y);
        self.write_view(&view, 4)
    }

    pub fn read_point16(&mut self) -> Result<Point16> {
        let view = self.read_view(4)?;
        Ok(Point16::new(view.lane(0), view.lane(1)))
    }

    pub fn write_rectangle(&mut self, r: Rectangle) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<i32>(0, r.x);
        view.set_lane::<i32>(1, r.y);
        view.set_lane::<i32>(2, r.width);
        view.set_lane::<i32>(3, r.height);
        self.write_view(&view, 16)
    }

    pub fn read_rectangle(&mut self) -> Result<Rectangle> {
        let view = self.read_view(16)?;
        Ok(Rectangle::new(
            view.lane(0),
            view.lane(1),
            view.lane(2),
            view.lane(3),
        ))
    }

    pub fn write_rectangle16(&mut self, r: Rectangle16) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<u16>(0, r.x);
        view.set_lane::<u16>(1, r.y);
        view.set_lane::<u16>(2, r.width);
        view.set_lane::<u16>(3, r.height);
        self.write_view(&view, 8)
    }

    pub fn read_rectangle16(&mut self) -> Result<Rectangle16> {
        let view = self.read_view(8)?;
        Ok(Rectangle16::new(
            view.lane(0),
            view.lane(1),
            view.lane(2),
            view.lane(3),
        ))
    }

    /// Writes the channels in `A, R, G, B` order.
    pub fn write_colour(&mut self, c: Colour) -> Result<()> {
        let mut view = PackedView::default();
        view.set_byte(0, c.a);
        view.set_byte(1, c.r);
        view.set_byte(2, c.g);
        view.set_byte(3, c.b);
        self.write_view(&view, 4)
    }

    pub fn read_colour(&mut self) -> Result<Colour> {
        let view = self.read_view(4)?;
        Ok(Colour::new(
            view.byte(0),
            view.byte(1),
            view.byte(2),
            view.byte(3),
        ))
    }

    pub fn write_complex(&mut self, c: Complex) -> Result<()> {
        let mut view = PackedView::default();
        view.set_lane::<f64>(0, c.re);
        view.set_lane::<f64>(1, c.im);
        self.write_view(&view, 16)
    }

    pub fn read_complex(&mut self) -> Result<Complex> {
        let view = self.read_view(16)?;
        Ok(Complex::new(view.lane(0), view.lane(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_roundtrip() {
        let mut buf = Buffer::with_capacity(8);
        buf.write_int24(Int24::from_i32(-70000)).unwrap();
        buf.write_point(Point::new(-3, 4)).unwrap();
        buf.write_point_f(PointF::new(0.5, -0.25)).unwrap();
        buf.write_point16(Point16::new(1, u16::MAX)).unwrap();
        buf.write_rectangle(Rectangle::new(1, 2, 640, 480)).unwrap();
        buf.write_rectangle16(Rectangle16::new(0, 0, 32, 32)).unwrap();
        buf.write_colour(Colour::new(0x80, 1, 2, 3)).unwrap();
        buf.write_complex(Complex::new(1.0, f64::NEG_INFINITY)).unwrap();
        assert_eq!(buf.size(), 3 + 8 + 8 + 4 + 16 + 8 + 4 + 16);

        buf.set_position(0).unwrap();
        assert_eq!(buf.read_int24().unwrap().to_i32(), -70000);
        assert_eq!(buf.read_point().unwrap(), Point::new(-3, 4));
        assert_eq!(buf.read_point_f().unwrap(), PointF::new(0.5, -0.25));
        assert_eq!(buf.read_point16().unwrap(), Point16::new(1, u16::MAX));
        assert_eq!(buf.read_rectangle().unwrap(), Rectangle::new(1, 2, 640, 480));
        assert_eq!(buf.read_rectangle16().unwrap(), Rectangle16::new(0, 0, 32, 32));
        assert_eq!(buf.read_colour().unwrap(), Colour::new(0x80, 1, 2, 3));
        assert_eq!(
            buf.read_complex().unwrap(),
            Complex::new(1.0, f64::NEG_INFINITY)
        );
        assert!(buf.is_filled());
    }

    #[test]
    fn test_shape_encoders_match_struct_blit() {
        let rect = Rectangle::new(-1, 7, 100, 200);
        let colour = Colour::opaque(10, 20, 30);

        let mut encoded = Buffer::new();
        encoded.write_rectangle(rect).unwrap();
        encoded.write_colour(colour).unwrap();

        let mut blitted = Buffer::new();
        blitted.write_struct(&rect).unwrap();
        blitted.write_struct(&colour).unwrap();

        assert_eq!(encoded.as_bytes().unwrap(), blitted.as_bytes().unwrap());
    }

    #[test]
    fn test_int24_wire_bytes() {
        let mut buf = Buffer::new();
        buf.write_int24(Int24::from_u32(0x00AB_CDEF)).unwrap();
        assert_eq!(buf.as_bytes().unwrap(), &[0xEF, 0xCD, 0xAB]);
    }
}
