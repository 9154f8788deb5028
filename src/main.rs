fn main() {
    mitratamiento_lib::run()
}
