fn main() {
    // Enables static linking of the vcruntime library on Windows builds
    static_vcruntime::metabuild();
}
